//! Method-set fingerprints for fast interface-compliance rejection.
//!
//! A fingerprint is a 64-bit bitmask with one bit per method identity.
//! Subset testing (`fp(I) & !fp(C) == 0`) is a necessary condition for
//! `C` implementing `I`: a clear bit proves a missing method, a matching
//! mask proves nothing. In practice the mask rejects the vast majority of
//! non-implementing pairs with a single AND-NOT, so only plausible pairs
//! reach the authoritative method-set comparison.

use crate::types::{MethodSet, TypeTable};

/// Compute the fingerprint of a method set.
///
/// Each method hashes its qualified id together with its parameter and
/// result counts (`id/params/results`) through CRC32, and sets bit
/// `hash mod 64`. The empty set fingerprints to 0, a subset of everything,
/// which is exactly right for the empty interface.
pub fn fingerprint(table: &TypeTable, mset: &MethodSet) -> u64 {
    let mut mask = 0u64;
    for sel in mset.iter() {
        let (params, results) = table.signature_arity(sel.sig);
        let sum = crc32fast::hash(format!("{}/{}/{}", sel.id, params, results).as_bytes());
        mask |= 1 << (sum % 64);
    }
    mask
}

/// Whether every bit of `iface` is present in `concrete`.
pub fn subset(iface: u64, concrete: u64) -> bool {
    iface & !concrete == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssa::ProgramBuilder;
    use crate::types::Basic;

    #[test]
    fn test_empty_method_set_fingerprints_to_zero() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/app");
        let int = b.basic(Basic::Int);
        let t = b.named(Some(pkg), "Plain", int);
        let prog = b.finish();

        let fp = fingerprint(prog.types(), &prog.method_set(t));
        assert_eq!(fp, 0);
        assert!(subset(fp, 0));
        assert!(subset(fp, u64::MAX));
    }

    #[test]
    fn test_implementer_fingerprint_covers_interface() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/app");
        let int = b.basic(Basic::Int);
        let sig = b.signature(&[int], &[]);
        let iface = b.interface(Some(pkg), &[("Write", sig)]).unwrap();
        let t = b.named(Some(pkg), "File", int);
        b.method(t, "Write", sig, false, None).unwrap();
        b.method(t, "Close", sig, false, None).unwrap();
        let prog = b.finish();

        let ifp = fingerprint(prog.types(), &prog.method_set(iface));
        let cfp = fingerprint(prog.types(), &prog.method_set(t));
        assert!(subset(ifp, cfp));
    }

    #[test]
    fn test_missing_method_is_rejected() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/app");
        let int = b.basic(Basic::Int);
        let sig = b.signature(&[int], &[]);
        let iface = b.interface(Some(pkg), &[("Write", sig)]).unwrap();
        let bare = b.named(Some(pkg), "Bare", int);
        let prog = b.finish();

        let ifp = fingerprint(prog.types(), &prog.method_set(iface));
        let cfp = fingerprint(prog.types(), &prog.method_set(bare));
        assert_ne!(ifp, 0);
        assert_eq!(cfp, 0);
        assert!(!subset(ifp, cfp));
    }

    #[test]
    fn test_package_qualifies_unexported_methods() {
        let mut b = ProgramBuilder::new();
        let pkg_a = b.package("example.com/a");
        let pkg_b = b.package("example.com/b");
        let int = b.basic(Basic::Int);
        let sig = b.signature(&[], &[]);
        let ta = b.named(Some(pkg_a), "T", int);
        let tb = b.named(Some(pkg_b), "T", int);
        b.method(ta, "mark", sig, false, None).unwrap();
        b.method(tb, "mark", sig, false, None).unwrap();
        let prog = b.finish();

        let sa = prog.method_set(ta);
        let sb = prog.method_set(tb);
        let ida = &sa.iter().next().unwrap().id;
        let idb = &sb.iter().next().unwrap().id;
        assert_ne!(ida, idb);
    }
}
