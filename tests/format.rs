use ash::vk;

use vkverify::compare;
use vkverify::format;
use vkverify::pixels::PlanarBuffer;

#[test]
fn plane_layouts_of_420_formats() {
    let desc = format::describe(vk::Format::G8_B8_R8_3PLANE_420_UNORM).unwrap();

    assert!(desc.is_multi_planar());
    assert_eq!(desc.plane_count(), 3);
    assert_eq!(desc.plane_format(0), vk::Format::R8_UNORM);
    assert_eq!(desc.plane_format(1), vk::Format::R8_UNORM);

    let extent = vk::Extent3D { width: 16, height: 8, depth: 1 };
    let luma = desc.plane_extent(extent, 0);
    let chroma = desc.plane_extent(extent, 1);

    assert_eq!((luma.width, luma.height), (16, 8));
    assert_eq!((chroma.width, chroma.height), (8, 4));

    let two_plane = format::describe(vk::Format::G8_B8R8_2PLANE_420_UNORM).unwrap();

    assert_eq!(two_plane.plane_count(), 2);
    assert_eq!(two_plane.plane_format(1), vk::Format::R8G8_UNORM);
    assert_eq!(two_plane.plane_element_size(1), 2);
}

#[test]
fn copy_compatibility_follows_texel_size() {
    assert!(format::copy_compatible(vk::Format::R8_UNORM, vk::Format::R8_UNORM));
    assert!(format::copy_compatible(vk::Format::R16_UNORM, vk::Format::R10X6_UNORM_PACK16));
    assert!(format::copy_compatible(vk::Format::R8G8_UNORM, vk::Format::R16_UNORM));
    assert!(!format::copy_compatible(vk::Format::R8_UNORM, vk::Format::R16_UNORM));
    assert!(!format::copy_compatible(
        vk::Format::G8_B8R8_2PLANE_420_UNORM,
        vk::Format::R8_UNORM
    ));
}

#[test]
fn dont_care_masks_cover_the_low_byte_only() {
    // 10-bit-in-16 formats leave 6 undefined bits in the low byte of
    // every little endian word
    assert_eq!(format::dont_care_byte_mask(6, 0), 0xc0);
    assert_eq!(format::dont_care_byte_mask(6, 1), 0xff);
    assert_eq!(format::dont_care_byte_mask(6, 2), 0xc0);
    assert_eq!(format::dont_care_byte_mask(4, 0), 0xf0);
    assert_eq!(format::dont_care_byte_mask(4, 3), 0xff);
    assert_eq!(format::dont_care_byte_mask(0, 0), 0xff);

    let g10 = format::describe(vk::Format::G10X6_B10X6R10X6_2PLANE_420_UNORM_3PACK16).unwrap();
    assert_eq!(g10.dont_care_low_bits, 6);

    let g12 = format::describe(vk::Format::G12X4_B12X4R12X4_2PLANE_420_UNORM_3PACK16).unwrap();
    assert_eq!(g12.dont_care_low_bits, 4);
}

#[test]
fn masked_comparison_ignores_undefined_bits() {
    let fmt = vk::Format::G10X6_B10X6R10X6_2PLANE_420_UNORM_3PACK16;
    let extent = vk::Extent3D { width: 4, height: 4, depth: 1 };

    let reference = PlanarBuffer::new_filled(fmt, extent, 3);
    let mut result = reference.clone();

    // flip undefined bits everywhere
    for plane in 0..result.plane_count() {
        for (i, byte) in result.plane_bytes_mut(plane).iter_mut().enumerate() {
            if i % 2 == 0 {
                *byte ^= 0x3f;
            }
        }
    }

    assert!(compare::compare_masked(&result, &reference).is_ok());

    // flipping a defined bit still fails
    result.plane_bytes_mut(0)[0] ^= 0x80;
    assert!(compare::compare_masked(&result, &reference).is_err());
}

#[test]
fn unorm_codec_round_trips_extremes() {
    let formats = [
        vk::Format::R8G8B8A8_UNORM,
        vk::Format::B8G8R8A8_UNORM,
        vk::Format::R4G4B4A4_UNORM_PACK16,
        vk::Format::R5G6B5_UNORM_PACK16,
        vk::Format::R5G5B5A1_UNORM_PACK16,
        vk::Format::A1R5G5B5_UNORM_PACK16,
        vk::Format::A2B10G10R10_UNORM_PACK32,
        vk::Format::R16_UNORM,
    ];

    for fmt in formats {
        let desc = format::describe(fmt).unwrap();
        let mut bytes = [0u8; 16];

        for value in [[0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]] {
            format::encode_texel(desc, value, &mut bytes);
            let back = format::decode_texel(desc, &bytes);

            for c in 0..4 {
                if desc.channel_bits[c] > 0 {
                    assert_eq!(back[c], value[c], "{:?} channel {}", fmt, c);
                }
            }
        }
    }
}

#[test]
fn snorm_decode_is_symmetric() {
    let desc = format::describe(vk::Format::R8G8B8A8_SNORM).unwrap();
    let mut bytes = [0u8; 4];

    format::encode_texel(desc, [1.0, -1.0, 0.0, 0.5], &mut bytes);

    assert_eq!(bytes[0], 127);
    assert_eq!(bytes[1] as i8, -127);
    assert_eq!(bytes[2], 0);

    let back = format::decode_texel(desc, &bytes);

    assert_eq!(back[0], 1.0);
    assert_eq!(back[1], -1.0);
    assert_eq!(back[2], 0.0);
    assert!((back[3] - 0.5).abs() < 1.0 / 127.0);
}

#[test]
fn float_codecs_preserve_bit_patterns() {
    let desc = format::describe(vk::Format::R32G32B32A32_SFLOAT).unwrap();
    let mut bytes = [0u8; 16];
    let value = [2.5, -100.25, 0.0, 6.5e7];

    format::encode_texel(desc, value, &mut bytes);
    assert_eq!(format::decode_texel(desc, &bytes), value);

    let desc = format::describe(vk::Format::R16G16B16A16_SFLOAT).unwrap();
    let mut bytes = [0u8; 8];

    format::encode_texel(desc, [1.5, -2.0, 0.25, 4096.0], &mut bytes);
    assert_eq!(format::decode_texel(desc, &bytes), [1.5, -2.0, 0.25, 4096.0]);
}

#[test]
fn bgr_formats_swizzle_storage_not_meaning() {
    let rgba = format::describe(vk::Format::R8G8B8A8_UNORM).unwrap();
    let bgra = format::describe(vk::Format::B8G8R8A8_UNORM).unwrap();

    let color = [1.0, 0.5, 0.0, 1.0];
    let mut rgba_bytes = [0u8; 4];
    let mut bgra_bytes = [0u8; 4];

    format::encode_texel(rgba, color, &mut rgba_bytes);
    format::encode_texel(bgra, color, &mut bgra_bytes);

    assert_eq!(rgba_bytes[0], bgra_bytes[2]);
    assert_eq!(rgba_bytes[2], bgra_bytes[0]);
    assert_eq!(format::decode_texel(bgra, &bgra_bytes), format::decode_texel(rgba, &rgba_bytes));
}
