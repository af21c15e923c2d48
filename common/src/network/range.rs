use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A raw IPv4 or IPv6 address that can be stepped in place.
///
/// Deliberately not `Copy`: use [`Address::duplicate`] to keep a base
/// address around while another copy is being incremented.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl Address {
    fn octets_mut(&mut self) -> &mut [u8] {
        match self {
            Address::V4(octets) => octets,
            Address::V6(octets) => octets,
        }
    }

    /// Steps to the next address, wrapping from all-ones back to all-zeroes.
    pub fn increment(&mut self) {
        increment_octets(self.octets_mut());
    }

    /// Returns an independent copy of this address.
    pub fn duplicate(&self) -> Address {
        match self {
            Address::V4(octets) => Address::V4(*octets),
            Address::V6(octets) => Address::V6(*octets),
        }
    }

    pub fn to_ip(&self) -> IpAddr {
        match self {
            Address::V4(octets) => IpAddr::V4(Ipv4Addr::from(*octets)),
            Address::V6(octets) => IpAddr::V6(Ipv6Addr::from(*octets)),
        }
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Address::V4(v4.octets()),
            IpAddr::V6(v6) => Address::V6(v6.octets()),
        }
    }
}

impl From<&Address> for IpAddr {
    fn from(addr: &Address) -> Self {
        addr.to_ip()
    }
}

/// Adds one to a big-endian byte string, carrying towards the first byte.
///
/// Wraps silently past the maximum value; callers bound the number of steps.
pub fn increment_octets(octets: &mut [u8]) {
    for octet in octets.iter_mut().rev() {
        *octet = octet.wrapping_add(1);
        if *octet != 0 {
            break;
        }
    }
}

pub fn increment(addr: &mut Address) {
    addr.increment();
}

pub fn duplicate(addr: &Address) -> Address {
    addr.duplicate()
}

/// Lazily walks `remaining` consecutive addresses starting at a base address.
#[derive(Debug, Clone)]
pub struct Addresses {
    cursor: Address,
    remaining: u128,
}

impl Addresses {
    pub fn new(base: Address, count: u128) -> Self {
        Self {
            cursor: base,
            remaining: count,
        }
    }

    pub fn empty() -> Self {
        Self::new(Address::V4([0; 4]), 0)
    }
}

impl Iterator for Addresses {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current: Address = self.cursor.duplicate();
        self.cursor.increment();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::target::NetworkPrefix;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> Address {
        Address::V4([a, b, c, d])
    }

    #[test]
    fn increment_carries_into_next_octet() {
        let mut addr = v4(1, 2, 3, 255);
        increment(&mut addr);
        assert_eq!(addr, v4(1, 2, 4, 0));

        let mut addr = v4(10, 255, 255, 255);
        addr.increment();
        assert_eq!(addr, v4(11, 0, 0, 0));
    }

    #[test]
    fn increment_wraps_at_maximum() {
        let mut addr = v4(255, 255, 255, 255);
        addr.increment();
        assert_eq!(addr, v4(0, 0, 0, 0));

        let mut addr = Address::V6([0xff; 16]);
        addr.increment();
        assert_eq!(addr, Address::V6([0; 16]));
    }

    #[test]
    fn increment_ipv6_low_bytes() {
        let mut addr = Address::from("2001:db8::ffff".parse::<IpAddr>().unwrap());
        addr.increment();
        assert_eq!(addr.to_ip(), "2001:db8::1:0".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn duplicate_does_not_alias() {
        let original = v4(192, 168, 0, 1);
        let mut copy = duplicate(&original);
        copy.increment();
        copy.increment();

        assert_eq!(original, v4(192, 168, 0, 1));
        assert_eq!(copy, v4(192, 168, 0, 3));
    }

    #[test]
    fn enumerates_prefix_in_order() {
        let prefix = NetworkPrefix {
            addr: "10.0.0.254".parse().unwrap(),
            prefix_len: Some(31),
        };
        let ips: Vec<IpAddr> = prefix.addresses().map(|a| a.to_ip()).collect();
        assert_eq!(
            ips,
            vec![
                "10.0.0.254".parse::<IpAddr>().unwrap(),
                "10.0.0.255".parse::<IpAddr>().unwrap(),
            ]
        );

        let block = NetworkPrefix {
            addr: "10.0.0.0".parse().unwrap(),
            prefix_len: Some(22),
        };
        let last = block.addresses().last().unwrap();
        assert_eq!(last, v4(10, 0, 3, 255));
        assert_eq!(block.addresses().count(), 1024);
    }

    #[test]
    fn enumeration_is_restartable_and_bounded() {
        let prefix = NetworkPrefix::single("255.255.255.255".parse().unwrap());
        let first: Vec<Address> = prefix.addresses().collect();
        let second: Vec<Address> = prefix.addresses().collect();

        assert_eq!(first, vec![v4(255, 255, 255, 255)]);
        assert_eq!(first, second);
    }

    #[test]
    fn yielded_addresses_are_independent() {
        let prefix = NetworkPrefix {
            addr: "172.16.0.0".parse().unwrap(),
            prefix_len: Some(30),
        };
        let mut yielded: Vec<Address> = prefix.addresses().collect();
        yielded[0].increment();

        assert_eq!(yielded[0], v4(172, 16, 0, 1));
        assert_eq!(yielded[1], v4(172, 16, 0, 1));
        assert_eq!(prefix.addresses().next(), Some(v4(172, 16, 0, 0)));
    }

    #[test]
    fn size_hint_matches_remaining() {
        let mut addrs = Addresses::new(v4(1, 1, 1, 1), 3);
        assert_eq!(addrs.size_hint(), (3, Some(3)));
        addrs.next();
        assert_eq!(addrs.size_hint(), (2, Some(2)));
        assert_eq!(Addresses::empty().count(), 0);
    }
}
