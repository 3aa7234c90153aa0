/// Destination key for an extracted entry. The prefix and entry name are
/// joined with a single `/` exactly as supplied.
pub fn destination_object_key(key_prefix: &str, entry_name: &str) -> String {
    format!("{key_prefix}/{entry_name}")
}

pub fn destination_uri(bucket: &str, key_prefix: &str) -> String {
    format!("s3://{bucket}/{key_prefix}")
}
