use clap::Parser;

use crate::error::{AppError, AppResult};

use super::RollupArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<RollupArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    RollupArgs::try_parse_from(args).map_err(AppError::from)
}
