mod common;

use kiln::{
    memory::{HostPointer, MemoryKind},
    AccessMode, ChannelOrder, ChannelType, ErrorKind, HostRegion, ImageDesc, ImageFormat,
    MapIntent, MemoryLocation, QueueProperties, StorageClass,
};

#[test]
fn released_buffer_is_rejected() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    kiln.context.release_buffer(buffer).unwrap();

    let error = kiln.context.release_buffer(buffer).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidMemObject);

    let error = kiln.queue.write_buffer(&buffer, 0, &[1], true, &[]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidMemObject);

    // Slot reuse doesn't revive the old handle.
    let fresh = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    assert_ne!(fresh.key(), buffer.key());
    assert!(kiln.context.memory_info(&buffer).is_err());
    assert!(kiln.context.memory_info(&fresh).is_ok());
}

#[test]
fn mapped_object_cant_be_released() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    let (view, _) = kiln
        .queue
        .map_buffer(&buffer, true, MapIntent::Read, 0, 16, &[])
        .unwrap();
    assert_eq!(kiln.context.memory_info(&buffer).unwrap().map_count, 1);

    let error = kiln.context.release_buffer(buffer).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidOperation);

    kiln.queue.unmap(view, &[]).unwrap().wait().unwrap();
    assert_eq!(kiln.context.memory_info(&buffer).unwrap().map_count, 0);
    kiln.context.release_buffer(buffer).unwrap();
}

#[test]
fn commands_in_flight_outlive_release() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(1 << 16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let gate = kiln.context.create_user_event().unwrap();

    let fill = kiln
        .queue
        .fill_buffer(&buffer, &[3], 0, 1 << 16, &[gate.event().clone()])
        .unwrap();
    kiln.context.release_buffer(buffer).unwrap();

    gate.complete().unwrap();
    assert!(fill.wait().unwrap().is_complete());
}

#[test]
fn released_queue_is_rejected() {
    let kiln = common::init();
    let queue = kiln
        .context
        .create_queue(0, QueueProperties::OUT_OF_ORDER_EXEC_MODE)
        .unwrap();
    assert_eq!(queue.device().unwrap(), 0);
    assert_eq!(
        queue.properties().unwrap(),
        QueueProperties::OUT_OF_ORDER_EXEC_MODE
    );
    queue.release().unwrap();

    assert_eq!(queue.release().unwrap_err().kind(), ErrorKind::InvalidCommandQueue);
    assert_eq!(
        queue.enqueue_marker(&[]).unwrap_err().kind(),
        ErrorKind::InvalidCommandQueue
    );

    let error = kiln.context.create_queue(1, QueueProperties::empty()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidDevice);
}

#[test]
fn released_context_is_rejected() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let user = kiln.context.create_user_event().unwrap();
    let (view, _) = kiln
        .queue
        .map_buffer(&buffer, true, MapIntent::Read, 0, 16, &[])
        .unwrap();

    kiln.context.release().unwrap();
    assert_eq!(kiln.context.release().unwrap_err().kind(), ErrorKind::InvalidContext);

    let error = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidContext);
    assert_eq!(user.event().status().unwrap_err().kind(), ErrorKind::InvalidContext);
    assert_eq!(kiln.queue.finish().unwrap_err().kind(), ErrorKind::InvalidContext);
    assert_eq!(
        kiln.queue.unmap(view, &[]).unwrap_err().kind(),
        ErrorKind::InvalidContext
    );
}

#[test]
fn handles_are_bound_to_their_context() {
    let first = common::init();
    let second = common::init();
    let buffer = first
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    let error = second.queue.write_buffer(&buffer, 0, &[1], true, &[]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidMemObject);
    assert_eq!(
        second.context.release_buffer(buffer).unwrap_err().kind(),
        ErrorKind::InvalidMemObject
    );
}

#[test]
fn memory_info_reports_storage() {
    let kiln = common::init();
    let region = HostRegion::new(32);
    let buffer = kiln
        .context
        .create_buffer(
            32,
            AccessMode::ReadOnly,
            StorageClass::HostPointerBacked(region),
        )
        .unwrap();

    let info = kiln.context.memory_info(&buffer).unwrap();
    assert_eq!(info.size, 32);
    assert_eq!(info.access, AccessMode::ReadOnly);
    assert_eq!(info.location, MemoryLocation::Host);
    assert_eq!(info.host_pointer, HostPointer::Alias);
    assert_eq!(info.kind, MemoryKind::Buffer);

    let format = ImageFormat::new(ChannelOrder::R, ChannelType::Float);
    let image = kiln
        .context
        .create_image(
            format,
            &ImageDesc::d2(4, 4),
            AccessMode::ReadWrite,
            StorageClass::DeviceAllocated,
        )
        .unwrap();
    assert_eq!(
        kiln.context.release_buffer(kiln::Buffer::new(image.key(), kiln.context.id()))
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidMemObject
    );
    kiln.context.release_image(image).unwrap();
}
