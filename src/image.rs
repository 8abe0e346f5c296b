//! Images and samplers from the HSA image extension.

use crate::agent::Agent;
use crate::api::HsaApi;
use crate::bindings as b;
use crate::error::{HsaError, Result};
use crate::memory::Allocation;
use crate::value::{Value, pack_values};
use std::sync::Arc;
use tracing::{debug, error, warn};

macro_rules! native_enum {
    ($(#[$meta:meta])* $name:ident: $native:ty { $($variant:ident = $value:path),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub(crate) fn to_hsa(self) -> $native {
                match self {
                    $($name::$variant => $value),*
                }
            }
        }
    };
}

native_enum!(ImageGeometry: b::hsa_ext_image_geometry_t {
    D1 = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_1D,
    D2 = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2D,
    D3 = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_3D,
    D1Array = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_1DA,
    D2Array = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DA,
    D1Buffer = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_1DB,
    D2Depth = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DDEPTH,
    D2ArrayDepth = b::hsa_ext_image_geometry_t_HSA_EXT_IMAGE_GEOMETRY_2DADEPTH,
});

native_enum!(ChannelOrder: b::hsa_ext_image_channel_order_t {
    A = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_A,
    R = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_R,
    Rx = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RX,
    Rg = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RG,
    Rgx = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGX,
    Ra = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RA,
    Rgb = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGB,
    Rgbx = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGBX,
    Rgba = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_RGBA,
    Bgra = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_BGRA,
    Argb = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_ARGB,
    Abgr = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_ABGR,
    Srgb = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SRGB,
    Srgbx = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SRGBX,
    Srgba = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SRGBA,
    Sbgra = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_SBGRA,
    Intensity = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_INTENSITY,
    Luminance = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_LUMINANCE,
    Depth = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_DEPTH,
    DepthStencil = b::hsa_ext_image_channel_order_t_HSA_EXT_IMAGE_CHANNEL_ORDER_DEPTH_STENCIL,
});

native_enum!(ChannelType: b::hsa_ext_image_channel_type_t {
    SnormInt8 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SNORM_INT8,
    SnormInt16 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SNORM_INT16,
    UnormInt8 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT8,
    UnormInt16 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT16,
    UnormInt24 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT24,
    UnormShort555 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_SHORT_555,
    UnormShort565 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_SHORT_565,
    UnormInt101010 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNORM_INT_101010,
    SignedInt8 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SIGNED_INT8,
    SignedInt16 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SIGNED_INT16,
    SignedInt32 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_SIGNED_INT32,
    UnsignedInt8 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNSIGNED_INT8,
    UnsignedInt16 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNSIGNED_INT16,
    UnsignedInt32 = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_UNSIGNED_INT32,
    HalfFloat = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_HALF_FLOAT,
    Float = b::hsa_ext_image_channel_type_t_HSA_EXT_IMAGE_CHANNEL_TYPE_FLOAT,
});

native_enum!(AccessPermission: b::hsa_access_permission_t {
    ReadOnly = b::hsa_access_permission_t_HSA_ACCESS_PERMISSION_RO,
    WriteOnly = b::hsa_access_permission_t_HSA_ACCESS_PERMISSION_WO,
    ReadWrite = b::hsa_access_permission_t_HSA_ACCESS_PERMISSION_RW,
});

impl AccessPermission {
    /// Capability bit an agent must report for this access.
    fn capability(self) -> u32 {
        match self {
            AccessPermission::ReadOnly => b::hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_READ_ONLY,
            AccessPermission::WriteOnly => b::hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_WRITE_ONLY,
            AccessPermission::ReadWrite => b::hsa_ext_image_capability_t_HSA_EXT_IMAGE_CAPABILITY_READ_WRITE,
        }
    }
}

native_enum!(AddressingMode: b::hsa_ext_sampler_addressing_mode_t {
    Undefined = b::hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_UNDEFINED,
    ClampToEdge = b::hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_CLAMP_TO_EDGE,
    ClampToBorder = b::hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_CLAMP_TO_BORDER,
    Repeat = b::hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_REPEAT,
    MirroredRepeat = b::hsa_ext_sampler_addressing_mode_t_HSA_EXT_SAMPLER_ADDRESSING_MODE_MIRRORED_REPEAT,
});

native_enum!(CoordinateMode: b::hsa_ext_sampler_coordinate_mode_t {
    Unnormalized = b::hsa_ext_sampler_coordinate_mode_t_HSA_EXT_SAMPLER_COORDINATE_MODE_UNNORMALIZED,
    Normalized = b::hsa_ext_sampler_coordinate_mode_t_HSA_EXT_SAMPLER_COORDINATE_MODE_NORMALIZED,
});

native_enum!(FilterMode: b::hsa_ext_sampler_filter_mode_t {
    Nearest = b::hsa_ext_sampler_filter_mode_t_HSA_EXT_SAMPLER_FILTER_MODE_NEAREST,
    Linear = b::hsa_ext_sampler_filter_mode_t_HSA_EXT_SAMPLER_FILTER_MODE_LINEAR,
});

/// Image description stored by a test before `ImageCreate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageParams {
    pub geometry: ImageGeometry,
    pub channel_order: ChannelOrder,
    pub channel_type: ChannelType,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub array_size: usize,
    pub access: AccessPermission,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            geometry: ImageGeometry::D2,
            channel_order: ChannelOrder::Rgba,
            channel_type: ChannelType::UnormInt8,
            width: 1,
            height: 1,
            depth: 1,
            array_size: 0,
            access: AccessPermission::ReadWrite,
        }
    }
}

impl ImageParams {
    pub(crate) fn descriptor(&self) -> b::hsa_ext_image_descriptor_t {
        b::hsa_ext_image_descriptor_t {
            geometry: self.geometry.to_hsa(),
            width: self.width,
            height: self.height,
            depth: self.depth,
            array_size: self.array_size,
            format: self.format(),
        }
    }

    pub(crate) fn format(&self) -> b::hsa_ext_image_format_t {
        b::hsa_ext_image_format_t {
            channel_type: self.channel_type.to_hsa(),
            channel_order: self.channel_order.to_hsa(),
        }
    }

    /// Addressable extent in pixels along x, y and z. Array layers take the
    /// coordinate after the last spatial one.
    pub fn extent(&self) -> [usize; 3] {
        let layers = self.array_size.max(1);
        let (w, h, d) = (self.width.max(1), self.height.max(1), self.depth.max(1));
        match self.geometry {
            ImageGeometry::D1 | ImageGeometry::D1Buffer => [w, 1, 1],
            ImageGeometry::D2 | ImageGeometry::D2Depth => [w, h, 1],
            ImageGeometry::D3 => [w, h, d],
            ImageGeometry::D1Array => [w, layers, 1],
            ImageGeometry::D2Array | ImageGeometry::D2ArrayDepth => [w, h, layers],
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.extent().iter().product()
    }
}

/// Sampler description stored by a test before `SamplerCreate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerParams {
    pub addressing: AddressingMode,
    pub coordinate: CoordinateMode,
    pub filter: FilterMode,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            addressing: AddressingMode::ClampToEdge,
            coordinate: CoordinateMode::Unnormalized,
            filter: FilterMode::Nearest,
        }
    }
}

impl SamplerParams {
    pub(crate) fn descriptor(&self) -> b::hsa_ext_sampler_descriptor_t {
        b::hsa_ext_sampler_descriptor_t {
            coordinate_mode: self.coordinate.to_hsa(),
            filter_mode: self.filter.to_hsa(),
            address_mode: self.addressing.to_hsa(),
        }
    }
}

/// Whether `agent` supports `params`' format and geometry with its access
/// permission.
pub fn is_supported(agent: &Agent, params: &ImageParams) -> Result<bool> {
    let api = agent.api();
    let format = params.format();
    let mut capability = 0u32;
    // SAFETY: `format` outlives the call.
    let status = unsafe {
        (api.hsa_ext_image_get_capability)(
            agent.handle,
            params.geometry.to_hsa(),
            &format,
            &mut capability,
        )
    };
    api.check(status, "hsa_ext_image_get_capability")?;
    let supported = capability & params.access.capability() != 0;
    debug!(?params, capability, supported, "image capability");
    Ok(supported)
}

/// Backing store size and alignment the runtime requires for `params`.
pub fn data_info(agent: &Agent, params: &ImageParams) -> Result<b::hsa_ext_image_data_info_t> {
    let api = agent.api();
    let descriptor = params.descriptor();
    let mut info = b::hsa_ext_image_data_info_t::default();
    // SAFETY: `descriptor` outlives the call.
    let status = unsafe {
        (api.hsa_ext_image_data_get_info)(
            agent.handle,
            &descriptor,
            params.access.to_hsa(),
            &mut info,
        )
    };
    api.check(status, "hsa_ext_image_data_get_info")?;
    Ok(info)
}

pub struct Image {
    api: Arc<HsaApi>,
    agent: b::hsa_agent_t,
    handle: b::hsa_ext_image_t,
    params: ImageParams,
    // Must outlive the image object.
    _data: Allocation,
}

impl Image {
    /// Creates an image over `data`. Running out of resources means the
    /// device cannot host this image at all, which is not applicable rather
    /// than a failure.
    pub fn create(agent: &Agent, params: ImageParams, data: Allocation) -> Result<Self> {
        let api = agent.api().clone();
        let descriptor = params.descriptor();
        let mut handle = b::hsa_ext_image_t { handle: 0 };
        // SAFETY: `descriptor` outlives the call; `data` is kept with the image.
        let status = unsafe {
            (api.hsa_ext_image_create)(
                agent.handle,
                &descriptor,
                data.as_ptr(),
                params.access.to_hsa(),
                &mut handle,
            )
        };
        if status == b::hsa_status_t_HSA_STATUS_ERROR_OUT_OF_RESOURCES {
            warn!(?params, "image does not fit on the device");
            return Err(HsaError::NotApplicable(format!(
                "out of resources creating {}x{}x{} image",
                params.width, params.height, params.depth
            )));
        }
        api.check(status, "hsa_ext_image_create")?;
        debug!(image = handle.handle, ?params, "created image");

        Ok(Image {
            api,
            agent: agent.handle,
            handle,
            params,
            _data: data,
        })
    }

    pub fn handle(&self) -> u64 {
        self.handle.handle
    }

    pub fn params(&self) -> &ImageParams {
        &self.params
    }

    /// Fills the whole image, repeating `values` as often as needed.
    pub fn initialize(&self, values: &[Value]) -> Result<()> {
        if values.is_empty() {
            return Err(HsaError::InvalidArgument(
                "image initialization needs at least one value".to_string(),
            ));
        }
        let range = region_extent(self.params.extent())?;
        let pixels: Vec<Value> = values.iter().copied().cycle().take(self.params.pixel_count()).collect();
        self.write([0; 3], range, &pixels)
    }

    /// Writes `values` into the box at `origin` spanning `range` pixels, one
    /// value per pixel in x-fastest order.
    pub fn write(&self, origin: [u32; 3], range: [u32; 3], values: &[Value]) -> Result<()> {
        let count: usize = range.iter().map(|&r| r as usize).product();
        if count != values.len() {
            return Err(HsaError::InvalidArgument(format!(
                "region of {} pixels given {} values",
                count,
                values.len()
            )));
        }
        let extent = self.params.extent();
        for axis in 0..3 {
            if origin[axis] as usize + range[axis] as usize > extent[axis] {
                return Err(HsaError::InvalidArgument(format!(
                    "region {:?}+{:?} exceeds image extent {:?}",
                    origin, range, extent
                )));
            }
        }
        let pixel_size = match values.first() {
            Some(v) => v.size(),
            None => return Ok(()),
        };
        if values.iter().any(|v| v.size() != pixel_size) {
            return Err(HsaError::InvalidArgument(
                "image values must all have the same size".to_string(),
            ));
        }

        let mut host = vec![0u8; count * pixel_size];
        pack_values(values, &mut host)?;
        let row_pitch = range[0] as usize * pixel_size;
        let slice_pitch = row_pitch * range[1] as usize;
        let region = b::hsa_ext_image_region_t {
            offset: b::hsa_dim3_t {
                x: origin[0],
                y: origin[1],
                z: origin[2],
            },
            range: b::hsa_dim3_t {
                x: range[0],
                y: range[1],
                z: range[2],
            },
        };

        // SAFETY: `host` holds `count` pixels laid out with the given pitches.
        let status = unsafe {
            (self.api.hsa_ext_image_import)(
                self.agent,
                host.as_ptr() as *const std::os::raw::c_void,
                row_pitch,
                slice_pitch,
                self.handle,
                &region,
            )
        };
        self.api.check(status, "hsa_ext_image_import")?;
        debug!(image = self.handle.handle, ?origin, ?range, "imported image data");
        Ok(())
    }
}

/// An image extent as an import region.
fn region_extent(extent: [usize; 3]) -> Result<[u32; 3]> {
    let mut range = [0u32; 3];
    for (r, &e) in range.iter_mut().zip(&extent) {
        *r = u32::try_from(e).map_err(|_| {
            HsaError::InvalidArgument(format!("image extent {:?} does not fit a 32-bit region", extent))
        })?;
    }
    Ok(range)
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("handle", &self.handle.handle)
            .field("params", &self.params)
            .finish()
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        debug!(image = self.handle.handle, "destroying image");
        // SAFETY: created in `create`, destroyed once.
        let status = unsafe { (self.api.hsa_ext_image_destroy)(self.agent, self.handle) };
        if status != b::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to destroy image: {}", self.api.status_string(status));
        }
    }
}

pub struct Sampler {
    api: Arc<HsaApi>,
    agent: b::hsa_agent_t,
    handle: b::hsa_ext_sampler_t,
}

impl Sampler {
    pub fn create(agent: &Agent, params: &SamplerParams) -> Result<Self> {
        let api = agent.api().clone();
        let descriptor = params.descriptor();
        let mut handle = b::hsa_ext_sampler_t { handle: 0 };
        // SAFETY: `descriptor` outlives the call.
        let status = unsafe { (api.hsa_ext_sampler_create)(agent.handle, &descriptor, &mut handle) };
        api.check(status, "hsa_ext_sampler_create")?;
        debug!(sampler = handle.handle, ?params, "created sampler");
        Ok(Sampler {
            api,
            agent: agent.handle,
            handle,
        })
    }

    pub fn handle(&self) -> u64 {
        self.handle.handle
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").field("handle", &self.handle.handle).finish()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        debug!(sampler = self.handle.handle, "destroying sampler");
        // SAFETY: created in `create`, destroyed once.
        let status = unsafe { (self.api.hsa_ext_sampler_destroy)(self.agent, self.handle) };
        if status != b::hsa_status_t_HSA_STATUS_SUCCESS {
            error!("Failed to destroy sampler: {}", self.api.status_string(status));
        }
    }
}
