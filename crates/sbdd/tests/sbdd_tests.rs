//! Sbdd tests
use errno::prelude::*;
use sbdd::*;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn new_sbdd(name: &str, capacity_mib: u64) -> (Sbdd, Arc<LocalStack>, Arc<dyn BlockDevice>) {
    init_logger();
    let stack = Arc::new(LocalStack::new());
    let sbdd = Sbdd::create(&SbddConfig::new(name, capacity_mib), stack.clone()).unwrap();
    let disk = stack.open(name).unwrap();
    (sbdd, stack, disk)
}

fn submit_write(disk: &dyn BlockDevice, addr: Sector, nsectors: usize, val: u8) -> BioResp {
    let req = BioReq::new_write(
        addr,
        vec![Segment::filled(nsectors * SECTOR_SIZE, val)],
        None,
    );
    disk.submit(Arc::new(req)).response().unwrap()
}

fn submit_read(disk: &dyn BlockDevice, addr: Sector, nsectors: usize) -> (BioResp, Vec<u8>) {
    let req = BioReq::new_read(addr, vec![Segment::zeroed(nsectors * SECTOR_SIZE)], None);
    let submission = disk.submit(Arc::new(req));
    let resp = submission.response().unwrap();
    let data = submission
        .req()
        .take_segments()
        .into_iter()
        .flat_map(|seg| seg.into_boxed().into_vec())
        .collect();
    (resp, data)
}

#[test]
fn new_disk_is_zeroed() {
    let (_sbdd, _stack, disk) = new_sbdd("zeroed", 1);
    let (resp, data) = submit_read(&*disk, 0, disk.total_sectors() as usize);
    assert_eq!(resp, Ok(()));
    assert_eq!(data.len(), disk.total_bytes());
    assert!(data.iter().all(|b| *b == 0));
}

#[test]
fn one_mib_write_read_sector_zero() {
    let (_sbdd, _stack, disk) = new_sbdd("onemib", 1);
    assert_eq!(disk.total_sectors(), 2048);

    assert_eq!(submit_write(&*disk, 0, 1, 0xAB), Ok(()));
    let (resp, data) = submit_read(&*disk, 0, 1);
    assert_eq!(resp, Ok(()));
    assert_eq!(data, vec![0xAB; 512]);

    // The neighbour is untouched
    let (_, data) = submit_read(&*disk, 1, 1);
    assert!(data.iter().all(|b| *b == 0));
}

#[test]
fn round_trip_between_other_ranges() {
    let (_sbdd, _stack, disk) = new_sbdd("roundtrip", 1);
    let pattern: Vec<u8> = (0..8 * SECTOR_SIZE).map(|i| (i % 251) as u8).collect();

    submit_write(&*disk, 99, 1, 0x01).unwrap();
    let req = BioReq::new_write(
        100,
        vec![Segment::from_boxed(pattern.clone().into_boxed_slice())],
        None,
    );
    assert_eq!(disk.submit(Arc::new(req)).response(), Some(Ok(())));
    submit_write(&*disk, 108, 1, 0x02).unwrap();

    let (_, data) = submit_read(&*disk, 100, 8);
    assert_eq!(data, pattern);
    let (_, data) = submit_read(&*disk, 99, 1);
    assert!(data.iter().all(|b| *b == 0x01));
    let (_, data) = submit_read(&*disk, 108, 1);
    assert!(data.iter().all(|b| *b == 0x02));
}

#[test]
fn request_past_the_end_is_truncated() {
    let (_sbdd, _stack, disk) = new_sbdd("tail", 1);
    let last = disk.total_sectors() - 1;

    // Two segments, the second lies entirely past the end
    let req = BioReqBuilder::new(BioType::Write)
        .addr(last)
        .segment(Segment::filled(SECTOR_SIZE, 0x33))
        .segment(Segment::filled(4 * SECTOR_SIZE, 0x44))
        .build();
    assert_eq!(disk.submit(Arc::new(req)).response(), Some(Ok(())));

    let (resp, data) = submit_read(&*disk, last - 1, 3);
    assert_eq!(resp, Ok(()));
    assert!(data[..SECTOR_SIZE].iter().all(|b| *b == 0));
    assert!(data[SECTOR_SIZE..2 * SECTOR_SIZE].iter().all(|b| *b == 0x33));
    // Nothing was read for the sector past the end
    assert!(data[2 * SECTOR_SIZE..].iter().all(|b| *b == 0));
}

#[test]
fn concurrent_disjoint_writes() {
    const NTHREADS: usize = 8;
    const NSECTORS: usize = 64;
    const NROUNDS: usize = 16;

    let (_sbdd, _stack, disk) = new_sbdd("disjoint", 1);
    let barrier = Arc::new(Barrier::new(NTHREADS));

    let handles: Vec<_> = (0..NTHREADS)
        .map(|i| {
            let disk = disk.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let base = (i * NSECTORS) as Sector;
                barrier.wait();
                for round in 0..NROUNDS {
                    let val = (i * NROUNDS + round) as u8;
                    // One sector per segment, so the lock is taken per sector
                    let segments = (0..NSECTORS)
                        .map(|_| Segment::filled(SECTOR_SIZE, val))
                        .collect();
                    let req = BioReq::new_write(base, segments, None);
                    assert_eq!(disk.submit(Arc::new(req)).response(), Some(Ok(())));

                    let (resp, data) = submit_read(&*disk, base, NSECTORS);
                    assert_eq!(resp, Ok(()));
                    assert!(data.iter().all(|b| *b == val));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..NTHREADS {
        let val = (i * NROUNDS + NROUNDS - 1) as u8;
        let (_, data) = submit_read(&*disk, (i * NSECTORS) as Sector, NSECTORS);
        assert!(data.iter().all(|b| *b == val));
    }
}

#[test]
fn two_succeed_then_rejected_after_delete() {
    let (mut sbdd, _stack, disk) = new_sbdd("scenario", 1);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = [0 as Sector, 1024]
        .into_iter()
        .map(|addr| {
            let disk = disk.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                submit_write(&*disk, addr, 16, 0x5C)
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    sbdd.delete();
    assert_eq!(sbdd.state(), LifecycleState::Destroyed);
    assert_eq!(submit_write(&*disk, 0, 1, 0x5C), Err(EIO));
    let (resp, data) = submit_read(&*disk, 0, 1);
    assert_eq!(resp, Err(EIO));
    // A rejected read leaves the buffer alone
    assert!(data.iter().all(|b| *b == 0));
}

#[test]
fn delete_under_load() {
    const NTHREADS: usize = 6;

    let (mut sbdd, stack, disk) = new_sbdd("load", 1);
    let delete_returned = Arc::new(AtomicBool::new(false));
    let late_completions = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(NTHREADS + 1));

    let handles: Vec<_> = (0..NTHREADS)
        .map(|i| {
            let disk = disk.clone();
            let barrier = barrier.clone();
            let delete_returned = delete_returned.clone();
            let late_completions = late_completions.clone();
            let rejected = rejected.clone();
            thread::spawn(move || {
                barrier.wait();
                // Keep submitting until the disk rejects us
                let mut n = 0;
                loop {
                    let delete_returned = delete_returned.clone();
                    let late_completions = late_completions.clone();
                    let on_complete: BioReqOnCompleteFn = Box::new(move |_req, resp| {
                        // A successful request completes while it still holds its
                        // reference, so delete cannot have returned yet.
                        if resp.is_ok() && delete_returned.load(Ordering::SeqCst) {
                            late_completions.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                    let addr = (i * 16 + n % 16) as Sector;
                    let req = BioReq::new_write(
                        addr,
                        vec![Segment::filled(SECTOR_SIZE, i as u8)],
                        Some(on_complete),
                    );
                    let resp = disk.submit(Arc::new(req)).response().unwrap();
                    if resp == Err(EIO) {
                        rejected.fetch_add(1, Ordering::SeqCst);
                        break;
                    }
                    assert_eq!(resp, Ok(()));
                    n += 1;
                }
                n
            })
        })
        .collect();

    barrier.wait();
    thread::sleep(std::time::Duration::from_millis(10));
    sbdd.delete();
    delete_returned.store(true, Ordering::SeqCst);

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(rejected.load(Ordering::SeqCst), NTHREADS);
    assert_eq!(late_completions.load(Ordering::SeqCst), 0);
    assert!(stack.disks().is_empty());
    assert!(stack.open("load").is_none());
}

#[test]
fn byte_level_access() {
    let (_sbdd, _stack, disk) = new_sbdd("bytes", 2);
    let data = vec![0x42; 3 * SECTOR_SIZE];
    assert_eq!(disk.write(SECTOR_SIZE, &data).unwrap(), data.len());

    let mut buf = vec![0; 5 * SECTOR_SIZE];
    assert_eq!(disk.read(0, &mut buf).unwrap(), buf.len());
    assert!(buf[..SECTOR_SIZE].iter().all(|b| *b == 0));
    assert!(buf[SECTOR_SIZE..4 * SECTOR_SIZE].iter().all(|b| *b == 0x42));
    assert!(buf[4 * SECTOR_SIZE..].iter().all(|b| *b == 0));
}

#[test]
fn several_independent_disks() {
    init_logger();
    let stack = Arc::new(LocalStack::new());
    let mut sbdd0 = Sbdd::create(&SbddConfig::new("sbdd0", 1), stack.clone()).unwrap();
    let sbdd1 = Sbdd::create(&SbddConfig::new("sbdd1", 2), stack.clone()).unwrap();
    assert_eq!(stack.disks().len(), 2);

    let disk0 = stack.open("sbdd0").unwrap();
    let disk1 = stack.open("sbdd1").unwrap();
    assert_eq!(disk1.total_sectors(), 2 * disk0.total_sectors());

    sbdd0.delete();
    assert_eq!(submit_write(&*disk0, 0, 1, 1), Err(EIO));
    assert_eq!(submit_write(&*disk1, 0, 1, 1), Ok(()));
    assert_eq!(sbdd1.state(), LifecycleState::Active);
}

#[test]
fn config_from_file() {
    let path = std::env::temp_dir().join(format!("sbdd_config_{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "name": "fromfile", "capacity_mib": 3 }"#).unwrap();
    let config = SbddConfig::from_path(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let stack = Arc::new(LocalStack::new());
    let sbdd = Sbdd::create(&config, stack.clone()).unwrap();
    assert_eq!(sbdd.name(), "fromfile");
    assert_eq!(sbdd.capacity(), 3 * MIB_SECTORS);
    assert!(Sbdd::create(&SbddConfig::new("", 1), stack).has_errno(EINVAL));
}
