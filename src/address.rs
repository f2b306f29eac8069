/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use rand::Rng;

/// One of the 24 permutations of `{1,2,3,4}`, as a 4-character lookup
/// table indexed by `digit - 1`.
const PERMS: [[u8; 4]; 24] = [
    [1, 2, 3, 4], [1, 2, 4, 3], [1, 3, 2, 4], [1, 3, 4, 2], [1, 4, 2, 3], [1, 4, 3, 2],
    [2, 1, 3, 4], [2, 1, 4, 3], [2, 3, 1, 4], [2, 3, 4, 1], [2, 4, 1, 3], [2, 4, 3, 1],
    [3, 1, 2, 4], [3, 1, 4, 2], [3, 2, 1, 4], [3, 2, 4, 1], [3, 4, 1, 2], [3, 4, 2, 1],
    [4, 1, 2, 3], [4, 1, 3, 2], [4, 2, 1, 3], [4, 2, 3, 1], [4, 3, 1, 2], [4, 3, 2, 1],
];

fn gen_perm<R: Rng>(rng: &mut R) -> [u8; 4] {
    PERMS[rng.gen_range(0..24)]
}

/// A hierarchical address: a length-`n` sequence of digits in `{1,2,3,4}`,
/// most-significant (root level) digit first.
pub type Address = Vec<u8>;

/// Floor division with the source's "−1 on any remainder" convention for
/// negative values.
fn floor_div(x: i64, d: i64) -> i64 {
    let q = x / d;
    let r = x % d;
    if r != 0 && (r < 0) != (d < 0) { q - 1 } else { q }
}

/// Builds the hierarchical address of a cell given its lower-left corner
/// `(xc, yc)`, cell size `(dx, dy)`, and the number of levels `n`.
pub fn construct_address(xc: f64, yc: f64, dx: f64, dy: f64, n: u32) -> Address {
    let mut x = ceil_div_f(xc, dx);
    let mut y = ceil_div_f(yc, dy);
    let mut addr = vec![0u8; n as usize];
    for j in (0..n as usize).rev() {
        let digit = 2 * (x.rem_euclid(2)) + (y.rem_euclid(2)) + 1;
        addr[j] = digit as u8;
        x = floor_div(x, 2);
        y = floor_div(y, 2);
    }
    addr
}

fn ceil_div_f(v: f64, d: f64) -> i64 {
    (v / d).ceil() as i64
}

/// Randomly permutes a list of addresses in place using the recursive
/// level-by-level bucket-and-permute structure: at each level, draw one
/// uniform permutation of `{1,2,3,4}` shared by every address that agrees
/// on the prefix seen so far, partition by the current digit, recurse,
/// then relabel the digit at this level through the permutation.
pub fn randomize_addresses<R: Rng>(addresses: &mut [Address], rng: &mut R) {
    if addresses.is_empty() {
        return;
    }
    let n = addresses[0].len();
    randomize_level(addresses, 0, n, rng);
}

fn randomize_level<R: Rng>(addresses: &mut [Address], level: usize, n: usize, rng: &mut R) {
    if level >= n {
        return;
    }

    let perm = gen_perm(rng);

    let mut buckets: [Vec<usize>; 4] = [vec![], vec![], vec![], vec![]];
    for (idx, addr) in addresses.iter().enumerate() {
        buckets[addr[level] as usize - 1].push(idx);
    }

    for bucket in buckets.iter() {
        if bucket.is_empty() {
            continue;
        }
        let mut sub: Vec<Address> = bucket.iter().map(|&i| addresses[i].clone()).collect();
        randomize_level(&mut sub, level + 1, n, rng);
        for (k, &orig_idx) in bucket.iter().enumerate() {
            addresses[orig_idx] = sub[k].clone();
        }
    }

    for addr in addresses.iter_mut() {
        let d = addr[level] as usize - 1;
        addr[level] = perm[d];
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    #[test]
    fn test_randomizer_is_bijection() {
        let addrs: Vec<Address> = vec![vec![1, 1], vec![1, 2], vec![2, 1], vec![2, 2]];
        let mut shuffled = addrs.clone();
        let mut rng = SmallRng::seed_from_u64(5);
        randomize_addresses(&mut shuffled, &mut rng);
        let original_set: HashSet<_> = addrs.iter().cloned().collect();
        let shuffled_set: HashSet<_> = shuffled.iter().cloned().collect();
        assert_eq!(original_set, shuffled_set);
    }

    #[test]
    fn test_s5_same_parent_invariant() {
        let addrs: Vec<Address> = vec![vec![1, 1], vec![1, 2], vec![2, 1], vec![2, 2]];
        let mut shuffled = addrs.clone();
        let mut rng = SmallRng::seed_from_u64(123);
        randomize_addresses(&mut shuffled, &mut rng);
        // addrs[0] and addrs[1] shared prefix "1" in the input
        assert_eq!(shuffled[0][0], shuffled[1][0]);
        // addrs[2] and addrs[3] shared prefix "2" in the input
        assert_eq!(shuffled[2][0], shuffled[3][0]);
    }

    #[test]
    fn test_randomizer_handles_singleton_bucket() {
        // a single address has no siblings to partition against at any
        // level, but every level must still draw a permutation and relabel
        let addrs: Vec<Address> = vec![vec![1, 2, 3]];
        let mut shuffled = addrs.clone();
        let mut rng = SmallRng::seed_from_u64(7);
        randomize_addresses(&mut shuffled, &mut rng);
        assert_eq!(shuffled.len(), 1);
        assert!(shuffled[0].iter().all(|&d| (1..=4).contains(&d)));
    }

    #[test]
    fn test_construct_address_root_digit() {
        let addr = construct_address(0.5, 0.5, 1.0, 1.0, 1);
        assert_eq!(addr.len(), 1);
        assert!(addr[0] >= 1 && addr[0] <= 4);
    }
}
