use super::bucket::BucketMap;

/// Keys of every bucket holding the maximum count, ascending.
/// An all-zero map has no peak.
pub fn peaks<const N: usize>(map: &BucketMap<N>) -> Vec<u8> {
    let max = map.iter().map(|b| b.count).max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    map.iter()
        .filter(|b| b.count == max)
        .map(|b| b.key)
        .collect()
}
