pub mod aliases;
pub mod dead_ledger;
pub mod fetcher;
pub mod m3u_parser;
pub mod prober;
pub mod reconciler;
pub mod storage;
pub mod upstream_index;

#[cfg(test)]
pub mod test_server;
