//! Admission control for new connections.
//!
//! Tracks live session counts, process-wide and per source address, and
//! refuses connections once a configured ceiling is reached. The counters are
//! the only mutable state shared across sessions; a single mutex serializes
//! admit/release from all worker threads.

use crate::error::{GatewayError, RejectReason, Result};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};

/// Session ceilings, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionLimits {
    pub total: usize,
    pub per_address: usize,
}

#[derive(Debug, Default)]
struct Counters {
    total: usize,
    per_address: HashMap<IpAddr, usize>,
}

/// Gatekeeper for new connections.
///
/// Constructed once and shared (`Arc`) between the listener and every live
/// [`AdmissionGuard`]. Injected state rather than globals, so limits can
/// differ per test and per listener.
#[derive(Debug)]
pub struct AdmissionController {
    limits: AdmissionLimits,
    counters: Mutex<Counters>,
}

impl AdmissionController {
    pub fn new(limits: AdmissionLimits) -> Self {
        Self {
            limits,
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Admits a connection from `addr` or reports which ceiling was hit.
    ///
    /// Checks the total ceiling first, then the per-address ceiling, and
    /// increments both counts atomically on success. The returned guard
    /// releases the counts when dropped.
    pub fn try_admit(self: &Arc<Self>, addr: IpAddr) -> Result<AdmissionGuard> {
        let mut counters = self.lock();

        if counters.total >= self.limits.total {
            return Err(GatewayError::AdmissionRejected(
                RejectReason::TotalLimitReached,
            ));
        }
        if counters.per_address.get(&addr).copied().unwrap_or(0) >= self.limits.per_address {
            return Err(GatewayError::AdmissionRejected(
                RejectReason::AddressLimitReached,
            ));
        }

        counters.total += 1;
        *counters.per_address.entry(addr).or_insert(0) += 1;
        drop(counters);

        Ok(AdmissionGuard {
            controller: Arc::clone(self),
            addr,
        })
    }

    /// Count of live sessions across all addresses.
    pub fn active_total(&self) -> usize {
        self.lock().total
    }

    /// Count of live sessions from one address.
    pub fn active_for(&self, addr: IpAddr) -> usize {
        self.lock().per_address.get(&addr).copied().unwrap_or(0)
    }

    /// Number of addresses currently holding at least one session.
    pub fn tracked_addresses(&self) -> usize {
        self.lock().per_address.len()
    }

    fn release(&self, addr: IpAddr) {
        let mut counters = self.lock();
        counters.total = counters.total.saturating_sub(1);
        if let Some(count) = counters.per_address.get_mut(&addr) {
            *count -= 1;
            // Zero-count entries are removed so the map stays bounded by the
            // number of live addresses, not of addresses ever seen.
            if *count == 0 {
                counters.per_address.remove(&addr);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live-session token. Holding one keeps the counters incremented; dropping
/// it releases both counts, so a session can never leak its admission slot.
#[derive(Debug)]
pub struct AdmissionGuard {
    controller: Arc<AdmissionController>,
    addr: IpAddr,
}

impl AdmissionGuard {
    pub fn addr(&self) -> IpAddr {
        self.addr
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.controller.release(self.addr);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn controller(total: usize, per_address: usize) -> Arc<AdmissionController> {
        Arc::new(AdmissionController::new(AdmissionLimits {
            total,
            per_address,
        }))
    }

    fn addr(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn admit_and_release_returns_to_empty() {
        let controller = controller(16, 4);
        let guards: Vec<_> = (1..=8)
            .map(|i| controller.try_admit(addr(i)).unwrap())
            .collect();
        assert_eq!(controller.active_total(), 8);
        assert_eq!(controller.tracked_addresses(), 8);

        drop(guards);
        assert_eq!(controller.active_total(), 0);
        assert_eq!(controller.tracked_addresses(), 0);
        assert_eq!(controller.active_for(addr(1)), 0);
    }

    #[test]
    fn per_address_ceiling_rejects_before_total() {
        let controller = controller(10, 2);
        let _a = controller.try_admit(addr(1)).unwrap();
        let _b = controller.try_admit(addr(1)).unwrap();

        assert_eq!(controller.active_for(addr(1)), 2);

        let rejected = controller.try_admit(addr(1));
        assert!(matches!(
            rejected,
            Err(GatewayError::AdmissionRejected(
                RejectReason::AddressLimitReached
            ))
        ));
        // The rejection changed nothing for the address.
        assert_eq!(controller.active_for(addr(1)), 2);
        // Other addresses are unaffected.
        assert_eq!(controller.active_for(addr(2)), 0);
        assert!(controller.try_admit(addr(2)).is_ok());
    }

    #[test]
    fn total_ceiling_rejects() {
        let controller = controller(2, 2);
        let _a = controller.try_admit(addr(1)).unwrap();
        let _b = controller.try_admit(addr(2)).unwrap();
        assert!(matches!(
            controller.try_admit(addr(3)),
            Err(GatewayError::AdmissionRejected(
                RejectReason::TotalLimitReached
            ))
        ));
    }

    #[test]
    fn slot_is_reusable_after_release() {
        let controller = controller(1, 1);
        let guard = controller.try_admit(addr(1)).unwrap();
        assert!(controller.try_admit(addr(1)).is_err());

        drop(guard);
        assert!(controller.try_admit(addr(1)).is_ok());
    }

    #[test]
    fn rejection_does_not_retain_address_entry() {
        let controller = controller(0, 4);
        assert!(controller.try_admit(addr(1)).is_err());
        assert_eq!(controller.tracked_addresses(), 0);
    }

    #[test]
    fn concurrent_admits_never_exceed_total() {
        let controller = controller(50, 50);
        let mut handles = Vec::new();
        for i in 0..4u8 {
            let controller = Arc::clone(&controller);
            handles.push(std::thread::spawn(move || {
                // Guards are returned, not dropped, so no slot frees up while
                // other threads are still admitting.
                (0..25)
                    .filter_map(|_| controller.try_admit(addr(i)).ok())
                    .collect::<Vec<_>>()
            }));
        }
        let guards: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(guards.len(), 50);
        assert_eq!(controller.active_total(), 50);

        drop(guards);
        assert_eq!(controller.active_total(), 0);
    }
}
