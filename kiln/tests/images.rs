mod common;

use {
    kiln::{
        AccessMode, ChannelOrder, ChannelType, ErrorKind, Host, HostRegion, Image, ImageDesc,
        ImageFormat, Kiln, MapIntent, StorageClass,
    },
    rand::RngCore,
};

fn rgba8() -> ImageFormat {
    ImageFormat::new(ChannelOrder::Rgba, ChannelType::UnsignedInt8)
}

fn image(kiln: &Kiln<Host>, format: ImageFormat, desc: ImageDesc) -> Image {
    kiln.context
        .create_image(format, &desc, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap()
}

fn random_bytes(size: usize) -> Vec<u8> {
    let mut bytes = vec![0; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[test]
fn region_write_touches_only_region() {
    let kiln = common::init();
    let image = image(&kiln, rgba8(), ImageDesc::d2(8, 4));
    let data = random_bytes(3 * 4 * 2);

    kiln.queue
        .write_image(&image, [2, 1, 0], [3, 2, 1], 0, 0, &data, true, &[])
        .unwrap();

    let mut whole = vec![0; 8 * 4 * 4];
    kiln.queue
        .read_image(&image, [0, 0, 0], [8, 4, 1], 0, 0, &mut whole, &[])
        .unwrap();

    for y in 0..4 {
        for x in 0..8 {
            let texel = &whole[(y * 8 + x) * 4..(y * 8 + x + 1) * 4];
            if (2..5).contains(&x) && (1..3).contains(&y) {
                let index = ((y - 1) * 3 + (x - 2)) * 4;
                assert_eq!(texel, &data[index..index + 4]);
            } else {
                assert_eq!(texel, &[0; 4]);
            }
        }
    }

    let mut part = vec![0; data.len()];
    kiln.queue
        .read_image(&image, [2, 1, 0], [3, 2, 1], 0, 0, &mut part, &[])
        .unwrap();
    assert_eq!(part, data);
}

#[test]
fn host_pitches_are_honored() {
    let kiln = common::init();
    let format = ImageFormat::new(ChannelOrder::R, ChannelType::UnsignedInt8);
    let mut bytes = vec![0xEE; 32 * 2];
    bytes[..4].copy_from_slice(&[1, 2, 3, 4]);
    bytes[32..36].copy_from_slice(&[5, 6, 7, 8]);

    let image = kiln
        .context
        .create_image(
            format,
            &ImageDesc::d2(4, 2).with_pitches(32, 0),
            AccessMode::ReadOnly,
            StorageClass::HostPointerBackedCopy(HostRegion::from_vec(bytes)),
        )
        .unwrap();
    let (_, layout) = kiln.context.image_layout(&image).unwrap();
    assert_eq!(layout.row_pitch, 32);

    let mut read = vec![0; 8];
    kiln.queue
        .read_image(&image, [0, 0, 0], [4, 2, 1], 0, 0, &mut read, &[])
        .unwrap();
    assert_eq!(read, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    let error = kiln
        .context
        .create_image(
            format,
            &ImageDesc::d2(4, 2).with_pitches(32, 0),
            AccessMode::ReadOnly,
            StorageClass::DeviceAllocated,
        )
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidImageSize);
}

#[test]
fn image_extent_is_checked() {
    let kiln = common::init();
    let error = kiln
        .context
        .create_image(
            rgba8(),
            &ImageDesc::d2(0, 4),
            AccessMode::ReadWrite,
            StorageClass::DeviceAllocated,
        )
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidImageSize);

    let image = image(&kiln, rgba8(), ImageDesc::d2(4, 4));
    let error = kiln
        .queue
        .write_image(&image, [2, 0, 0], [3, 1, 1], 0, 0, &[0; 12], true, &[])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidValue);
}

#[test]
fn copies_between_images() {
    let kiln = common::init();
    let src = image(&kiln, rgba8(), ImageDesc::d2(4, 4));
    let dst = image(&kiln, rgba8(), ImageDesc::d2(8, 8));
    let data = random_bytes(4 * 4 * 4);

    kiln.queue
        .write_image(&src, [0, 0, 0], [4, 4, 1], 0, 0, &data, false, &[])
        .unwrap();
    kiln.queue
        .copy_image(&src, &dst, [1, 1, 0], [4, 4, 0], [2, 2, 1], &[])
        .unwrap();

    let mut read = vec![0; 2 * 2 * 4];
    kiln.queue
        .read_image(&dst, [4, 4, 0], [2, 2, 1], 0, 0, &mut read, &[])
        .unwrap();
    assert_eq!(&read[0..8], &data[(4 + 1) * 4..(4 + 3) * 4]);
    assert_eq!(&read[8..16], &data[(8 + 1) * 4..(8 + 3) * 4]);

    let float = image(
        &kiln,
        ImageFormat::new(ChannelOrder::R, ChannelType::Float),
        ImageDesc::d2(4, 4),
    );
    let error = kiln
        .queue
        .copy_image(&src, &float, [0, 0, 0], [0, 0, 0], [1, 1, 1], &[])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ImageFormatMismatch);

    let error = kiln
        .queue
        .copy_image(&src, &src, [0, 0, 0], [1, 1, 0], [2, 2, 1], &[])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MemCopyOverlap);
    kiln.queue
        .copy_image(&src, &src, [0, 0, 0], [2, 0, 0], [2, 4, 1], &[])
        .unwrap();
}

#[test]
fn copies_through_buffers() {
    let kiln = common::init();
    let image = image(&kiln, rgba8(), ImageDesc::d3(4, 4, 2));
    let buffer = kiln
        .context
        .create_buffer(256, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let data = random_bytes(2 * 2 * 2 * 4);

    kiln.queue.write_buffer(&buffer, 16, &data, false, &[]).unwrap();
    kiln.queue
        .copy_buffer_to_image(&buffer, &image, 16, [1, 1, 0], [2, 2, 2], &[])
        .unwrap();
    kiln.queue
        .copy_image_to_buffer(&image, &buffer, [1, 1, 0], [2, 2, 2], 128, &[])
        .unwrap();

    let mut read = vec![0; data.len()];
    kiln.queue.read_buffer(&buffer, 128, &mut read, &[]).unwrap();
    assert_eq!(read, data);
}

#[test]
fn image_map_reports_pitches() {
    let kiln = common::init();
    let image = image(&kiln, rgba8(), ImageDesc::d2(8, 4));
    let data = random_bytes(8 * 4 * 4);
    kiln.queue
        .write_image(&image, [0, 0, 0], [8, 4, 1], 0, 0, &data, false, &[])
        .unwrap();

    let (view, _) = kiln
        .queue
        .map_image(&image, true, MapIntent::Read, [2, 1, 0], [2, 2, 1], &[])
        .unwrap();
    assert_eq!(view.row_pitch(), 32);
    let bytes = view.to_vec();
    assert_eq!(&bytes[..8], &data[32 + 8..32 + 16]);
    assert_eq!(&bytes[32..40], &data[64 + 8..64 + 16]);
    kiln.queue.unmap(view, &[]).unwrap();
}
