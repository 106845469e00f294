extern crate clap;
extern crate env_logger;
extern crate log;

use clap::{value_parser, Arg, ArgMatches, Command};
use errno::prelude::*;
use log::{debug, info};
use sbdd::{
    BioReq, BioType, BlockDevice, LocalStack, Sbdd, SbddConfig, Sector, Segment, SECTOR_SIZE,
};
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

fn main() {
    env_logger::init();

    let matches = Command::new("sbdd_ctl")
        .version("0.1.0")
        .about("Create an in-memory block device, exercise it concurrently, then delete it")
        // Input: JSON file with the disk configuration
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON configuration, e.g. {\"name\": \"sbdd\", \"capacity_mib\": 100}"),
        )
        .arg(
            Arg::new("capacity_mib")
                .long("capacity-mib")
                .value_name("MIB")
                .takes_value(true)
                .value_parser(value_parser!(u64).range(1..))
                .help("Capacity in MiB, overriding the configuration"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .takes_value(true)
                .default_value("4")
                .value_parser(value_parser!(u64).range(1..1025)),
        )
        .arg(
            Arg::new("sectors_per_thread")
                .long("sectors-per-thread")
                .value_name("N")
                .takes_value(true)
                .default_value("64")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .get_matches();

    match run(&matches) {
        Ok(summary) => println!("{}", summary),
        Err(e) => {
            eprintln!("sbdd_ctl: {}", e.backtrace());
            std::process::exit(1);
        }
    }
}

fn run(matches: &ArgMatches) -> Result<String> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            debug!("sbdd config (json) file name {:?}", path);
            SbddConfig::from_path(path).cause_err(|e| errno!(e.errno(), "bad configuration"))?
        }
        None => SbddConfig::default(),
    };
    if let Some(capacity_mib) = matches.get_one::<u64>("capacity_mib") {
        config.capacity_mib = *capacity_mib;
    }
    config.validate()?;
    debug!("the sbdd config is: {}", serde_json::to_string(&config)?);

    let nthreads = *matches.get_one::<u64>("threads").unwrap_or(&4);
    let nsectors = *matches.get_one::<u64>("sectors_per_thread").unwrap_or(&64);
    let needed = nthreads
        .checked_mul(nsectors)
        .ok_or_else(|| errno!(EINVAL, "workload too large"))?;
    if needed > config.capacity_sectors()? {
        return_errno!(EINVAL, "the workload does not fit in the disk");
    }

    let stack = Arc::new(LocalStack::new());
    let mut sbdd = Sbdd::create(&config, stack.clone())?;
    let disk = stack
        .open(&config.name)
        .ok_or_else(|| errno!(ENODEV, "the disk is not registered"))?;

    let barrier = Arc::new(Barrier::new(nthreads as usize));
    let workers: Vec<_> = (0..nthreads)
        .map(|i| {
            let disk = disk.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                write_and_verify(&*disk, i * nsectors, nsectors, i as u8)
            })
        })
        .collect();

    let mut total = 0;
    for worker in workers {
        total += worker
            .join()
            .map_err(|_| errno!(EIO, "a worker panicked"))??;
    }
    info!("{} sectors written and verified", total);

    sbdd.delete();
    let late = submit(&*disk, BioType::Write, 0, 1, 0);
    if late.response() != Some(Err(EIO)) {
        return_errno!(EIO, "a request after delete was not rejected");
    }

    Ok(format!(
        "disk {}: {} sectors, {} workers wrote and verified {} sectors, \
         request after delete rejected with {}",
        config.name,
        config.capacity_sectors()?,
        nthreads,
        total,
        EIO
    ))
}

/// Write `nsectors` sectors at `addr`, one segment per sector, and read them
/// back in a single segment.
fn write_and_verify(
    disk: &dyn BlockDevice,
    addr: Sector,
    nsectors: u64,
    seed: u8,
) -> Result<u64> {
    let segments = (0..nsectors)
        .map(|i| Segment::filled(SECTOR_SIZE, seed.wrapping_add(i as u8)))
        .collect();
    let req = BioReq::new_write(addr, segments, None);
    let submission = disk.submit(Arc::new(req));
    check_response(submission.response())?;

    let submission = submit(disk, BioType::Read, addr, nsectors, 0);
    check_response(submission.response())?;
    let segments = submission.req().take_segments();
    let data = segments[0].as_slice();
    for (i, sector) in data.chunks(SECTOR_SIZE).enumerate() {
        let expected = seed.wrapping_add(i as u8);
        if sector.iter().any(|b| *b != expected) {
            return_errno!(EIO, "read back unexpected data");
        }
    }
    Ok(nsectors)
}

fn submit(
    disk: &dyn BlockDevice,
    type_: BioType,
    addr: Sector,
    nsectors: u64,
    val: u8,
) -> sbdd::BioSubmission {
    let segment = Segment::filled(nsectors as usize * SECTOR_SIZE, val);
    let req = match type_ {
        BioType::Read => BioReq::new_read(addr, vec![segment], None),
        BioType::Write => BioReq::new_write(addr, vec![segment], None),
    };
    disk.submit(Arc::new(req))
}

fn check_response(resp: Option<sbdd::BioResp>) -> Result<()> {
    match resp {
        Some(Ok(())) => Ok(()),
        Some(Err(errno)) => Err(errno!(errno, "request failed")),
        None => Err(errno!(EIO, "request not completed")),
    }
}
