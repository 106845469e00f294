mod drain_signal;
mod ops_count;

pub(crate) use self::drain_signal::DrainSignal;
pub(crate) use self::ops_count::OpsCount;
