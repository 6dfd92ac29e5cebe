mod entry;
mod logger;

use percentile_rollup::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
