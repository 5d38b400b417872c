mod common;

use {
    kiln::{AccessMode, ErrorKind, HostRegion, MapIntent, Rect, StorageClass},
    rand::{Rng, RngCore},
};

fn random_bytes(size: usize) -> Vec<u8> {
    let mut bytes = vec![0; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[test]
fn write_read_round_trip() {
    let kiln = common::init();
    let max = kiln.context.max_mem_alloc_size() as usize;
    let random = rand::thread_rng().gen_range(1..1 << 16);

    for &size in &[1, random, max] {
        let buffer = kiln
            .context
            .create_buffer(size, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap();

        let ranges = [
            (0, size),
            (0, 0),
            (size / 3, size - size / 3),
            (size - 1, 1),
            (size / 2, (size + 1) / 4),
            (size, 0),
        ];
        for &(offset, len) in &ranges {
            let data = random_bytes(len);
            kiln.queue
                .write_buffer(&buffer, offset, &data, false, &[])
                .unwrap();

            let mut read = vec![0; len];
            kiln.queue
                .read_buffer(&buffer, offset, &mut read, &[])
                .unwrap();
            assert!(
                read == data,
                "round trip of {} bytes at {} of {} differs",
                len,
                offset,
                size
            );
        }
        kiln.context.release_buffer(buffer).unwrap();
    }
}

#[test]
fn buffer_sizes_are_bounded() {
    let kiln = common::init();
    let max = kiln.context.max_mem_alloc_size() as usize;

    for &size in &[0, max + 1] {
        let error = kiln
            .context
            .create_buffer(size, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidBufferSize);
    }
}

#[test]
fn empty_transfers_are_noops() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    kiln.queue.write_buffer(&buffer, 16, &[], true, &[]).unwrap();
    kiln.queue.read_buffer(&buffer, 0, &mut [], &[]).unwrap();

    let error = kiln.queue.write_buffer(&buffer, 12, &[0; 8], true, &[]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidValue);
}

#[test]
fn host_storage_is_initialized() {
    let kiln = common::init();
    let data = random_bytes(256);

    for storage in vec![
        StorageClass::HostPointerBackedCopy(HostRegion::from_slice(&data)),
        StorageClass::HostAllocatedCopy(HostRegion::from_slice(&data)),
        StorageClass::HostPointerBacked(HostRegion::from_slice(&data)),
    ] {
        let buffer = kiln
            .context
            .create_buffer(256, AccessMode::ReadWrite, storage)
            .unwrap();
        let mut read = vec![0; 256];
        kiln.queue.read_buffer(&buffer, 0, &mut read, &[]).unwrap();
        assert_eq!(read, data);
    }

    let error = kiln
        .context
        .create_buffer(
            512,
            AccessMode::ReadWrite,
            StorageClass::HostPointerBackedCopy(HostRegion::from_slice(&data)),
        )
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidHostPtr);
}

#[test]
fn host_backed_buffer_aliases_region() {
    let kiln = common::init();
    let region = HostRegion::new(64);
    let buffer = kiln
        .context
        .create_buffer(
            64,
            AccessMode::ReadWrite,
            StorageClass::HostPointerBacked(region.clone()),
        )
        .unwrap();

    kiln.queue.write_buffer(&buffer, 8, &[7; 8], true, &[]).unwrap();
    assert_eq!(&region.read()[8..16], &[7; 8]);
}

#[test]
fn copy_preserves_bytes() {
    let kiln = common::init();
    let data = random_bytes(1024);
    let src = kiln
        .context
        .create_buffer(1024, AccessMode::ReadOnly, StorageClass::DeviceAllocated)
        .unwrap();
    let dst = kiln
        .context
        .create_buffer(1024, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    kiln.queue.write_buffer(&src, 0, &data, false, &[]).unwrap();
    kiln.queue.copy_buffer(&src, &dst, 100, 300, 500, &[]).unwrap();
    // Disjoint ranges of one buffer.
    kiln.queue.copy_buffer(&dst, &dst, 300, 0, 200, &[]).unwrap();

    let mut read = vec![0; 1024];
    kiln.queue.read_buffer(&dst, 0, &mut read, &[]).unwrap();
    assert_eq!(&read[300..800], &data[100..600]);
    assert_eq!(&read[0..200], &data[100..300]);
    assert!(read[200..300].iter().all(|&byte| byte == 0));
}

#[test]
fn overlapping_copy_is_rejected() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(64, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    let error = kiln.queue.copy_buffer(&buffer, &buffer, 0, 8, 16, &[]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MemCopyOverlap);

    let error = kiln.queue.copy_buffer(&buffer, &buffer, 0, 60, 8, &[]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidValue);
}

#[test]
fn rect_addressing_uses_pitches() {
    let kiln = common::init();
    let (width, height) = (4, 3);
    let buffer = kiln
        .context
        .create_buffer(
            2 * width * height,
            AccessMode::ReadWrite,
            StorageClass::DeviceAllocated,
        )
        .unwrap();
    kiln.queue
        .fill_buffer(&buffer, &[0xAA], 0, 2 * width * height, &[])
        .unwrap();

    let data = random_bytes(width * height);
    let rect = Rect::planar([0, 0], width, [0, 0], 2 * width, width, height);
    kiln.queue.write_buffer_rect(&buffer, &rect, &data, false, &[]).unwrap();

    let mut read = vec![0; 2 * width * height];
    kiln.queue.read_buffer(&buffer, 0, &mut read, &[]).unwrap();
    for row in 0..height {
        let line = &read[row * 2 * width..(row + 1) * 2 * width];
        assert_eq!(&line[..width], &data[row * width..(row + 1) * width]);
        assert!(line[width..].iter().all(|&byte| byte == 0xAA));
    }

    let mut back = vec![0; width * height];
    let rect = Rect::planar([0, 0], 2 * width, [0, 0], width, width, height);
    kiln.queue.read_buffer_rect(&buffer, &rect, &mut back, &[]).unwrap();
    assert_eq!(back, data);
}

#[test]
fn rect_out_of_bounds_is_rejected() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(32, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    let rect = Rect::planar([0, 0], 8, [0, 0], 8, 8, 5);
    let error = kiln
        .queue
        .write_buffer_rect(&buffer, &rect, &[0; 40], true, &[])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidValue);
}

#[test]
fn fill_repeats_pattern() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(64, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    kiln.queue.fill_buffer(&buffer, &[1, 2, 3, 4], 8, 16, &[]).unwrap();
    let mut read = vec![0; 64];
    kiln.queue.read_buffer(&buffer, 0, &mut read, &[]).unwrap();

    assert!(read[..8].iter().all(|&byte| byte == 0));
    assert_eq!(&read[8..24], &[1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
    assert!(read[24..].iter().all(|&byte| byte == 0));

    let error = kiln.queue.fill_buffer(&buffer, &[1, 2, 3], 0, 3, &[]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidValue);
}

#[test]
fn map_reflects_contents() {
    let kiln = common::init();
    let data = random_bytes(128);

    for storage in vec![StorageClass::DeviceAllocated, StorageClass::HostAllocated] {
        let buffer = kiln
            .context
            .create_buffer(128, AccessMode::ReadWrite, storage)
            .unwrap();
        kiln.queue.write_buffer(&buffer, 0, &data, false, &[]).unwrap();

        let (view, _) = kiln
            .queue
            .map_buffer(&buffer, true, MapIntent::Read, 32, 64, &[])
            .unwrap();
        assert_eq!(view.to_vec(), &data[32..96]);
        assert_eq!(&*view.read_range(8..16).unwrap(), &data[40..48]);
        kiln.queue.unmap(view, &[]).unwrap();

        let (mut view, _) = kiln
            .queue
            .map_buffer(&buffer, true, MapIntent::Write, 0, 16, &[])
            .unwrap();
        view.write().unwrap().write(&[9; 16]);
        kiln.queue.unmap(view, &[]).unwrap();

        let (view, _) = kiln
            .queue
            .map_buffer(&buffer, true, MapIntent::Read, 0, 32, &[])
            .unwrap();
        assert_eq!(&view.to_vec()[..16], &[9; 16]);
        assert_eq!(&view.to_vec()[16..], &data[16..32]);
        kiln.queue.unmap(view, &[]).unwrap();

        let mut read = vec![0; 128];
        kiln.queue.read_buffer(&buffer, 0, &mut read, &[]).unwrap();
        assert_eq!(&read[..16], &[9; 16]);
        assert_eq!(&read[16..], &data[16..]);
    }
}

#[test]
fn read_view_rejects_writes() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    let (mut view, _) = kiln
        .queue
        .map_buffer(&buffer, true, MapIntent::Read, 0, 16, &[])
        .unwrap();
    assert_eq!(view.write().unwrap_err().kind(), ErrorKind::InvalidOperation);
    assert_eq!(
        view.read_range(8..24).unwrap_err().kind(),
        ErrorKind::InvalidValue
    );
    kiln.queue.unmap(view, &[]).unwrap();

    let error = kiln
        .queue
        .map_buffer(&buffer, true, MapIntent::Read, 0, 0, &[])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidValue);
}

#[test]
fn async_read_fills_region_on_completion() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(32, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let data = random_bytes(32);
    kiln.queue.write_buffer(&buffer, 0, &data, false, &[]).unwrap();

    let region = HostRegion::new(48);
    let event = kiln
        .queue
        .read_buffer_async(&buffer, 0, 32, &region, 16, &[])
        .unwrap();
    assert!(event.wait().unwrap().is_complete());
    assert_eq!(&region.read()[16..], &data[..]);
}
