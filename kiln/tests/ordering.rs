mod common;

use {
    kiln::{
        wait_for_events, AccessMode, CommandExecutionStatus, CommandType, ErrorKind,
        QueueProperties, StorageClass,
    },
    rand::Rng,
    std::{
        sync::{mpsc, Arc, Mutex},
        time::Duration,
    },
};

#[test]
fn wait_lists_order_writes() {
    let mut rng = rand::thread_rng();

    for &mode in &common::MODES {
        let kiln = common::init_with(mode);
        let buffer = kiln
            .context
            .create_buffer(8, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap();

        for _ in 0..100 {
            let gate = kiln.context.create_user_event().unwrap();
            let values: Vec<u64> = (0..rng.gen_range(2..6)).map(|_| rng.gen()).collect();

            let mut last = gate.event().clone();
            for value in &values {
                last = kiln
                    .queue
                    .write_buffer(&buffer, 0, &value.to_ne_bytes(), false, &[last])
                    .unwrap();
            }
            assert!(!last.status().unwrap().is_terminal());

            gate.complete().unwrap();
            assert!(last.wait().unwrap().is_complete());

            let mut read = [0; 8];
            kiln.queue.read_buffer(&buffer, 0, &mut read, &[]).unwrap();
            assert_eq!(u64::from_ne_bytes(read), *values.last().unwrap());
        }

        kiln.queue.finish().unwrap();
    }
}

#[test]
fn dependent_waits_below_running() {
    let running = CommandExecutionStatus::Running.rank();

    for &mode in &common::MODES {
        let kiln = common::init_with(mode);
        let buffer = kiln
            .context
            .create_buffer(1 << 16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap();

        for trial in 0..100u32 {
            let gate = kiln.context.create_user_event().unwrap();
            let first = kiln
                .queue
                .fill_buffer(&buffer, &trial.to_ne_bytes(), 0, 1 << 16, &[gate.event().clone()])
                .unwrap();
            let second = kiln
                .queue
                .fill_buffer(&buffer, &[7], 0, 1 << 16, &[first.clone()])
                .unwrap();

            assert!(second.status().unwrap().rank() < running);
            gate.complete().unwrap();

            loop {
                // Dependent first: once it runs the dependency must already be complete.
                let dependent = second.status().unwrap();
                let dependency = first.status().unwrap();
                if dependent.rank() >= running {
                    assert!(dependency.is_complete(), "{:?} ran before its wait list", dependent);
                }
                if dependent.is_terminal() {
                    break;
                }
            }
            assert!(second.wait().unwrap().is_complete());
        }

        kiln.queue.finish().unwrap();
    }
}

#[test]
fn in_order_queue_runs_in_admission_order() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(4, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    for trial in 0..100u32 {
        let gate = kiln.context.create_user_event().unwrap();
        kiln.queue
            .write_buffer(&buffer, 0, &0u32.to_ne_bytes(), false, &[gate.event().clone()])
            .unwrap();
        // Without waits, yet ordered after the gated write.
        kiln.queue
            .write_buffer(&buffer, 0, &trial.to_ne_bytes(), false, &[])
            .unwrap();
        gate.complete().unwrap();

        let mut read = [0; 4];
        kiln.queue.read_buffer(&buffer, 0, &mut read, &[]).unwrap();
        assert_eq!(u32::from_ne_bytes(read), trial);
    }
}

#[test]
fn status_only_moves_forward() {
    for &mode in &common::MODES {
        let kiln = common::init_with(mode);
        let buffer = kiln
            .context
            .create_buffer(1 << 20, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap();
        let gate = kiln.context.create_user_event().unwrap();

        let events: Vec<_> = (0..8)
            .map(|_| {
                kiln.queue
                    .fill_buffer(&buffer, &[1, 2, 3, 4], 0, 1 << 20, &[gate.event().clone()])
                    .unwrap()
            })
            .collect();

        for event in &events {
            assert_eq!(event.status().unwrap(), CommandExecutionStatus::Queued);
        }
        gate.complete().unwrap();

        let mut ranks = vec![0; events.len()];
        while ranks.iter().any(|&rank| rank < CommandExecutionStatus::Complete.rank()) {
            for (event, rank) in events.iter().zip(&mut ranks) {
                let now = event.status().unwrap().rank();
                assert!(now >= *rank, "status moved backwards");
                *rank = now;
            }
        }
    }
}

#[test]
fn failure_propagates_through_wait_lists() {
    for &mode in &common::MODES {
        let kiln = common::init_with(mode);
        let buffer = kiln
            .context
            .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap();
        let gate = kiln.context.create_user_event().unwrap();

        let first = kiln
            .queue
            .write_buffer(&buffer, 0, &[1; 16], false, &[gate.event().clone()])
            .unwrap();
        let second = kiln
            .queue
            .fill_buffer(&buffer, &[2], 0, 16, &[first.clone()])
            .unwrap();

        gate.fail(ErrorKind::OutOfResources).unwrap();

        let expected = CommandExecutionStatus::Error(ErrorKind::ExecStatusErrorForEventsInWaitList);
        assert_eq!(
            wait_for_events(&[first, second]).unwrap(),
            vec![expected, expected]
        );

        let error = kiln.queue.finish().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExecStatusErrorForEventsInWaitList);

        // Reported once.
        kiln.queue.finish().unwrap();
    }
}

#[test]
fn finish_reports_earliest_admitted_failure() {
    for &mode in &common::MODES {
        let kiln = common::init_with(mode);
        let buffer = kiln
            .context
            .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap();
        let earlier = kiln.context.create_user_event().unwrap();
        let later = kiln.context.create_user_event().unwrap();

        let write = kiln
            .queue
            .write_buffer(&buffer, 0, &[1; 16], false, &[earlier.event().clone()])
            .unwrap();
        let fill = kiln
            .queue
            .fill_buffer(&buffer, &[2], 0, 16, &[later.event().clone()])
            .unwrap();

        // The later command fails first.
        later.fail(ErrorKind::OutOfResources).unwrap();
        earlier.fail(ErrorKind::InvalidValue).unwrap();

        let expected = CommandExecutionStatus::Error(ErrorKind::ExecStatusErrorForEventsInWaitList);
        assert_eq!(write.wait().unwrap(), expected);
        assert_eq!(fill.wait().unwrap(), expected);

        let error = kiln.queue.finish().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExecStatusErrorForEventsInWaitList);
        assert!(
            error.message().contains("WriteBuffer") && error.message().contains("epoch 0"),
            "unexpected failure reported: {}",
            error.message()
        );
        kiln.queue.finish().unwrap();
    }
}

#[test]
fn blocking_call_reports_failed_dependency() {
    let kiln = common::init();
    let buffer = kiln
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let gate = kiln.context.create_user_event().unwrap();
    gate.fail(ErrorKind::InvalidValue).unwrap();

    let error = kiln
        .queue
        .write_buffer(&buffer, 0, &[1; 16], true, &[gate.event().clone()])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ExecStatusErrorForEventsInWaitList);
}

#[test]
fn user_event_accepts_one_terminal_status() {
    let kiln = common::init();
    let user = kiln.context.create_user_event().unwrap();
    assert_eq!(user.event().command_type(), CommandType::User);

    let error = user.set_status(CommandExecutionStatus::Running).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidValue);

    user.complete().unwrap();
    let error = user.fail(ErrorKind::OutOfResources).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidOperation);
    assert!(user.event().status().unwrap().is_complete());
}

#[test]
fn callbacks_fire_once_on_notifier_thread() {
    let kiln = common::init_with(QueueProperties::OUT_OF_ORDER_EXEC_MODE);
    let buffer = kiln
        .context
        .create_buffer(64, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let gate = kiln.context.create_user_event().unwrap();
    let (sender, receiver) = mpsc::channel();

    let events: Vec<_> = (0..16)
        .map(|index| {
            let event = kiln
                .queue
                .fill_buffer(&buffer, &[index as u8], 0, 64, &[gate.event().clone()])
                .unwrap();
            let sender = sender.clone();
            event
                .set_callback(move |event, status| {
                    let thread = std::thread::current().name().map(String::from);
                    sender
                        .send((index, event.command_type(), status, thread))
                        .unwrap();
                })
                .unwrap();
            event
        })
        .collect();
    drop(sender);

    let error = events[0].set_callback(|_, _| {}).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidOperation);

    gate.complete().unwrap();
    kiln.queue.finish().unwrap();

    let mut seen = vec![false; events.len()];
    for _ in 0..events.len() {
        let (index, command_type, status, thread) =
            receiver.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(!seen[index], "callback of event {} fired twice", index);
        seen[index] = true;
        assert_eq!(command_type, CommandType::FillBuffer);
        assert!(status.is_complete());
        assert_eq!(thread.as_deref(), Some("kiln-notifier"));
    }
    assert!(seen.into_iter().all(|seen| seen));
}

#[test]
fn callback_on_terminal_event_still_deferred() {
    let kiln = common::init();
    let user = kiln.context.create_user_event().unwrap();
    user.complete().unwrap();

    let fired = Arc::new(Mutex::new(None));
    let (sender, receiver) = mpsc::channel();
    {
        let fired = fired.clone();
        user.event()
            .set_callback(move |_, status| {
                *fired.lock().unwrap() = Some(std::thread::current().id());
                sender.send(status).unwrap();
            })
            .unwrap();
    }

    let status = receiver.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(status.is_complete());
    assert_ne!(*fired.lock().unwrap(), Some(std::thread::current().id()));
}

#[test]
fn markers_and_barriers_join_commands() {
    for &mode in &common::MODES {
        let kiln = common::init_with(mode);
        let buffer = kiln
            .context
            .create_buffer(32, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
            .unwrap();
        let gate = kiln.context.create_user_event().unwrap();

        let write = kiln
            .queue
            .write_buffer(&buffer, 0, &[5; 32], false, &[gate.event().clone()])
            .unwrap();
        let marker = kiln.queue.enqueue_marker(&[]).unwrap();
        assert_eq!(marker.command_type(), CommandType::Marker);
        assert!(!marker.status().unwrap().is_terminal());

        let barrier = kiln.queue.enqueue_barrier(&[write.clone()]).unwrap();
        assert_eq!(barrier.command_type(), CommandType::Barrier);

        gate.complete().unwrap();
        assert!(marker.wait().unwrap().is_complete());
        assert!(barrier.wait().unwrap().is_complete());
        assert!(write.status().unwrap().is_complete());
    }
}

#[test]
fn barrier_orders_out_of_order_queue() {
    let kiln = common::init_with(QueueProperties::OUT_OF_ORDER_EXEC_MODE);
    let buffer = kiln
        .context
        .create_buffer(4, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    for trial in 0..100u32 {
        let gate = kiln.context.create_user_event().unwrap();
        kiln.queue
            .write_buffer(&buffer, 0, &0u32.to_ne_bytes(), false, &[gate.event().clone()])
            .unwrap();
        kiln.queue.enqueue_barrier(&[]).unwrap();
        let last = kiln
            .queue
            .write_buffer(&buffer, 0, &trial.to_ne_bytes(), false, &[])
            .unwrap();
        gate.complete().unwrap();
        last.wait().unwrap();

        let mut read = [0; 4];
        kiln.queue.read_buffer(&buffer, 0, &mut read, &[]).unwrap();
        assert_eq!(u32::from_ne_bytes(read), trial);
    }
}

#[test]
fn profiling_timestamps_are_ordered() {
    let kiln = common::init_with(QueueProperties::PROFILING_ENABLE);
    let buffer = kiln
        .context
        .create_buffer(1 << 16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();

    let event = kiln.queue.fill_buffer(&buffer, &[7], 0, 1 << 16, &[]).unwrap();
    event.wait().unwrap();
    let info = event.profiling().unwrap();
    assert!(info.queued <= info.submitted);
    assert!(info.submitted <= info.start);
    assert!(info.start <= info.end);

    let plain = common::init();
    let buffer = plain
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let event = plain.queue.fill_buffer(&buffer, &[7], 0, 16, &[]).unwrap();
    event.wait().unwrap();
    assert_eq!(
        event.profiling().unwrap_err().kind(),
        ErrorKind::ProfilingInfoNotAvailable
    );
}

#[test]
fn events_of_other_contexts_are_rejected() {
    let first = common::init();
    let second = common::init();
    let buffer = first
        .context
        .create_buffer(16, AccessMode::ReadWrite, StorageClass::DeviceAllocated)
        .unwrap();
    let foreign = second.context.create_user_event().unwrap();

    let error = first
        .queue
        .fill_buffer(&buffer, &[1], 0, 16, &[foreign.event().clone()])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidContext);

    let local = first.context.create_user_event().unwrap();
    let error = wait_for_events(&[local.event().clone(), foreign.event().clone()]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidContext);
}
