//! Shared test harness modules for the item store CLI.

use super::*;

mod helpers;
mod load_unit;
