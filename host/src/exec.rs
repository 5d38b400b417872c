//! Command execution on worker threads.

use {
    crate::{
        kernel::{KernelArgs, WorkItem},
        Host,
    },
    kiln_core::{Command, ErrorKind, HostRegion, MapIntent, NdRange, Rect},
    thread_profiler::profile_scope,
};

/// Execute command on the calling thread.
pub(crate) fn execute(command: &Command<Host>) -> Result<(), ErrorKind> {
    match command {
        Command::Copy { src, dst, rect } => copy_rect(src.region(), dst.region(), rect),
        Command::Read { src, dst, rect } => copy_rect(src.region(), dst, rect),
        Command::Write { src, dst, rect } => copy_rect(src, dst.region(), rect),
        Command::Fill {
            dst,
            pattern,
            offset,
            size,
        } => fill(dst.region(), pattern, *offset, *size),
        Command::Unmap {
            memory,
            mapping,
            offset,
            size,
            intent,
        } => {
            if *intent == MapIntent::Write && !mapping.region.same(memory.region()) {
                copy_rect(
                    &mapping.region,
                    memory.region(),
                    &Rect::linear(mapping.offset, *offset, *size),
                )
            } else {
                Ok(())
            }
        }
        Command::Dispatch {
            kernel,
            args,
            range,
        } => dispatch(range, args, |item, args| (kernel.function())(item, args)),
        Command::Marker | Command::Barrier => Ok(()),
    }
}

fn row_in(len: usize, start: usize, width: usize) -> Result<(), ErrorKind> {
    match start.checked_add(width) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ErrorKind::OutOfResources),
    }
}

/// Copy rows of `rect` from `src` into `dst`.
/// Regions are locked in address order so concurrent copies in both directions can't deadlock.
pub(crate) fn copy_rect(src: &HostRegion, dst: &HostRegion, rect: &Rect) -> Result<(), ErrorKind> {
    profile_scope!("copy_rect");

    if rect.is_empty() {
        return Ok(());
    }
    let width = rect.region[0];

    if src.same(dst) {
        let mut bytes = dst.write();
        let len = bytes.len();
        for (from, to) in rect.rows() {
            row_in(len, from, width)?;
            row_in(len, to, width)?;
            bytes.copy_within(from..from + width, to);
        }
        return Ok(());
    }

    let (src_bytes, mut dst_bytes) = if src.addr() < dst.addr() {
        let src_bytes = src.read();
        (src_bytes, dst.write())
    } else {
        let dst_bytes = dst.write();
        (src.read(), dst_bytes)
    };

    for (from, to) in rect.rows() {
        row_in(src_bytes.len(), from, width)?;
        row_in(dst_bytes.len(), to, width)?;
        dst_bytes[to..to + width].copy_from_slice(&src_bytes[from..from + width]);
    }
    Ok(())
}

fn fill(dst: &HostRegion, pattern: &[u8], offset: usize, size: usize) -> Result<(), ErrorKind> {
    profile_scope!("fill");

    if size == 0 {
        return Ok(());
    }
    if pattern.is_empty() || size % pattern.len() != 0 {
        return Err(ErrorKind::InvalidValue);
    }

    let mut bytes = dst.write();
    row_in(bytes.len(), offset, size)?;
    for chunk in bytes[offset..offset + size].chunks_mut(pattern.len()) {
        chunk.copy_from_slice(pattern);
    }
    Ok(())
}

/// Run `function` for every work item of `range`, one work group at a time.
/// Local memory is zeroed before each group.
pub(crate) fn dispatch<F>(
    range: &NdRange,
    args: &[kiln_core::KernelArgValue<Host>],
    function: F,
) -> Result<(), ErrorKind>
where
    F: Fn(&WorkItem, &mut KernelArgs<'_>) -> Result<(), ErrorKind>,
{
    profile_scope!("dispatch");

    let dims = range.dims();
    let global = range.global();
    let offset = range.offset();
    let local = range.local().unwrap_or([1; 3]);
    let groups = [global[0] / local[0], global[1] / local[1], global[2] / local[2]];

    let mut kernel_args = KernelArgs::new(args);

    for gz in 0..groups[2] {
        for gy in 0..groups[1] {
            for gx in 0..groups[0] {
                kernel_args.reset_locals();
                let group_id = [gx, gy, gz];
                for lz in 0..local[2] {
                    for ly in 0..local[1] {
                        for lx in 0..local[0] {
                            let local_id = [lx, ly, lz];
                            let mut global_id = [0; 3];
                            for dim in 0..3 {
                                global_id[dim] =
                                    offset[dim] + group_id[dim] * local[dim] + local_id[dim];
                            }
                            let item = WorkItem {
                                dims,
                                global_id,
                                local_id,
                                group_id,
                                global_size: global,
                                local_size: local,
                                num_groups: groups,
                                global_offset: offset,
                            };
                            function(&item, &mut kernel_args)?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn copy_within_region() {
        let region = HostRegion::from_vec((0..16).collect());
        copy_rect(&region, &region, &Rect::linear(0, 8, 8)).unwrap();
        assert_eq!(&region.read()[8..], &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn copy_pitched_rows() {
        let (w, h) = (3, 4);
        let src = HostRegion::from_vec((0..(w * h) as u8).collect());
        let dst = HostRegion::new(2 * w * h);
        copy_rect(&src, &dst, &Rect::planar([0, 0], w, [0, 0], 2 * w, w, h)).unwrap();

        let dst = dst.to_vec();
        for y in 0..h {
            assert_eq!(&dst[y * 2 * w..y * 2 * w + w], &src.read()[y * w..y * w + w]);
            assert!(dst[y * 2 * w + w..(y + 1) * 2 * w].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn out_of_bounds_row_fails() {
        let src = HostRegion::new(4);
        let dst = HostRegion::new(8);
        assert_eq!(
            copy_rect(&src, &dst, &Rect::linear(0, 0, 8)),
            Err(ErrorKind::OutOfResources)
        );
    }

    #[test]
    fn fill_repeats_pattern() {
        let region = HostRegion::new(12);
        fill(&region, &[1, 2], 2, 8).unwrap();
        assert_eq!(region.to_vec(), vec![0, 0, 1, 2, 1, 2, 1, 2, 1, 2, 0, 0]);
    }

    #[test]
    fn dispatch_visits_every_item_once() {
        let range = NdRange::new(Some(&[1, 2]), &[4, 6], Some(&[2, 3])).unwrap();
        let seen = RefCell::new(Vec::new());
        dispatch(&range, &[], |item, _| {
            assert_eq!(item.work_dim(), 2);
            assert_eq!(item.global_size(2), 1);
            assert_eq!(
                item.global_id(0),
                item.global_offset(0) + item.group_id(0) * item.local_size(0) + item.local_id(0)
            );
            seen.borrow_mut().push(item.global_linear_id());
            Ok(())
        })
        .unwrap();

        let mut seen = seen.into_inner();
        seen.sort();
        assert_eq!(seen, (0..24).collect::<Vec<_>>());
    }
}
