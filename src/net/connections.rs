//! Connection lists built from the kernel TCP/UDP tables.
//!
//! Both tables share one layout: a single header line, then one record per
//! connection with hex-encoded local/remote endpoints at fields 1 and 2, a
//! hex state code at field 3, and an owning-process field at index 7.

use std::path::Path;

use crate::models::ConnectionRecord;
use crate::net::addr;
use crate::procfs;

/// Minimum fields a connection record must carry to be usable.
const MIN_FIELDS: usize = 10;

/// Builds the connection list for one table. A missing table yields an
/// empty list.
pub fn collect(table_path: &Path) -> Vec<ConnectionRecord> {
    procfs::read_table(table_path, 1, MIN_FIELDS)
        .iter()
        .map(|fields| record_from_fields(fields))
        .collect()
}

fn record_from_fields(fields: &[String]) -> ConnectionRecord {
    ConnectionRecord {
        local_addr: addr::decode_address(&fields[1]),
        remote_addr: addr::decode_address(&fields[2]),
        status: addr::decode_state(&fields[3]),
        pid: fields[7].parse().unwrap_or(0),
    }
}
