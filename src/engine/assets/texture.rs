use crate::engine::assets::AssetError;
use crate::engine::graphics::TextureData;

/// Decode PNG/JPEG bytes to RGBA8.
pub fn decode_texture(bytes: &[u8]) -> Result<TextureData, AssetError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureData {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn png_decodes_to_rgba() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let tex = decode_texture(&png).unwrap();
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.rgba.len(), 3 * 2 * 4);
        assert_eq!(&tex.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let err = decode_texture(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AssetError::Image(_)));
    }
}
