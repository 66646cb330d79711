//! Texture data and GPU upload

use crate::backend::traits::*;
use crate::backend::types::*;
use image::GenericImageView;

/// CPU-side RGBA8 texture data
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels. `data` length must be `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>, name: &str) -> Self {
        debug_assert_eq!(data.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            data,
            name: name.to_string(),
        }
    }

    /// Decode an embedded image (PNG etc.) into RGBA8
    pub fn decode(bytes: &[u8], name: &str) -> Result<Self, String> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| format!("failed to decode texture '{name}': {e}"))?;
        let (width, height) = image.dimensions();
        Ok(Self::new(width, height, image.to_rgba8().into_raw(), name))
    }

    /// One-pixel solid color texture
    pub fn solid(color: [u8; 4], name: &str) -> Self {
        Self::new(1, 1, color.to_vec(), name)
    }

    /// One-pixel white texture (untinted sprite drawing)
    pub fn white() -> Self {
        Self::solid([255; 4], "white")
    }
}

/// GPU texture with its view, uploaded as sRGB RGBA8
pub struct GpuTexture {
    pub handle: TextureHandle,
    pub view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
    pub name: String,
}

impl GpuTexture {
    pub fn create<B: GraphicsBackend>(backend: &mut B, data: &TextureData) -> BackendResult<Self> {
        let handle = backend.create_texture(&TextureDescriptor {
            label: Some(data.name.clone()),
            width: data.width,
            height: data.height,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;
        backend.write_texture(handle, &data.data, data.width, data.height);
        let view = backend.create_texture_view(handle)?;

        Ok(Self {
            handle,
            view,
            width: data.width,
            height: data.height,
            name: data.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_texture_is_one_pixel() {
        let tex = TextureData::solid([10, 20, 30, 255], "s");
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(tex.data, vec![10, 20, 30, 255]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(TextureData::decode(&[0, 1, 2, 3], "junk").is_err());
    }
}
