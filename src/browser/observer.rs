use tracing::warn;

use crate::browser::driver::{NetworkEvent, NetworkEventKind, PageDriver};
use crate::error::ProbeError;

/// Run `action` with a network listener of `kind` attached, then detach it.
///
/// Returns the action's value together with the events that satisfied
/// `keep`. The listener is detached on every path, including when `action`
/// fails; in that case the action's error wins and a detach failure is only
/// logged.
pub fn observe_network<D, T, F, P>(
    driver: &mut D,
    kind: NetworkEventKind,
    keep: P,
    action: F,
) -> Result<(T, Vec<NetworkEvent>), ProbeError>
where
    D: PageDriver + ?Sized,
    F: FnOnce(&mut D) -> Result<T, ProbeError>,
    P: Fn(&NetworkEvent) -> bool,
{
    let id = driver.observe_start(kind)?;

    match action(driver) {
        Ok(value) => {
            let events = driver.observe_stop(id)?;
            let matched = events.into_iter().filter(|e| keep(e)).collect();
            Ok((value, matched))
        }
        Err(err) => {
            if let Err(detach) = driver.observe_stop(id) {
                warn!(listener = id, error = %detach, "failed to detach network listener");
            }
            Err(err)
        }
    }
}
