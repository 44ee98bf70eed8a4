use serde_json::json;

use super::connection::{Connection, Connector};
use super::state::{transition, Effect, Event, WatchState};
use crate::entities::Coordinates;
use crate::error::Error;

struct WatchSession<C> {
    vehicle_id: String,
    state: WatchState,
    last_fix: Option<Coordinates>,
    conn: C,
}

/// Owns the single live vehicle subscription. Watching a new vehicle
/// always releases the previous session's connection first, so at most
/// one connection is ever open.
pub struct SubscriptionManager<C: Connector> {
    connector: C,
    url: String,
    session: Option<WatchSession<C::Conn>>,
}

impl<C: Connector> SubscriptionManager<C> {
    pub fn new(connector: C, url: String) -> Self {
        Self {
            connector,
            url,
            session: None,
        }
    }

    pub fn state(&self) -> WatchState {
        self.session
            .as_ref()
            .map(|session| session.state)
            .unwrap_or(WatchState::Idle)
    }

    pub fn last_fix(&self) -> Option<Coordinates> {
        self.session.as_ref().and_then(|session| session.last_fix)
    }

    pub fn watched_vehicle(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.vehicle_id.as_str())
    }

    /// Starts watching a vehicle, releasing any previous session first.
    #[tracing::instrument(skip(self))]
    pub async fn watch(&mut self, vehicle_id: &str) -> Result<(), Error> {
        self.release().await;

        let conn = self.connector.connect(&self.url).await?;
        let mut session = WatchSession {
            vehicle_id: vehicle_id.to_string(),
            state: WatchState::Connecting,
            last_fix: None,
            conn,
        };

        if let Err(err) = apply(&mut session, Event::Opened).await {
            // the subscribe send failed; don't leave the socket open
            if let Err(close_err) = session.conn.close().await {
                tracing::warn!(?close_err, "failed to close connection");
            }
            return Err(err);
        }

        self.session = Some(session);

        Ok(())
    }

    /// Waits for the next position fix for the watched vehicle,
    /// driving the receive loop. Returns None once the session ends;
    /// the connection has been closed by then.
    pub async fn next_fix(&mut self) -> Option<Coordinates> {
        loop {
            let ended = match self.session.as_mut() {
                None => return None,
                Some(session) => {
                    if session.state == WatchState::Closed {
                        true
                    } else {
                        let event = match session.conn.recv().await {
                            Some(Ok(raw)) => Event::MessageReceived(raw),
                            Some(Err(err)) => Event::Errored(err),
                            None => Event::Closed,
                        };

                        match apply(session, event).await {
                            Ok(Some(fix)) => return Some(fix),
                            Ok(None) => {}
                            Err(err) => {
                                tracing::warn!(?err, "watch session failed");
                            }
                        }

                        session.state == WatchState::Closed
                    }
                }
            };

            if ended {
                self.release().await;
                return None;
            }
        }
    }

    /// Ends the current watch session, closing its connection. Safe to
    /// call when nothing is being watched.
    #[tracing::instrument(skip(self))]
    pub async fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.state = WatchState::Closed;

            if let Err(err) = session.conn.close().await {
                tracing::warn!(?err, "failed to close watch connection");
            }
        }
    }
}

/// Runs one state-machine step and carries out its effects. Returns
/// the position fix recorded by this step, if any.
async fn apply<C: Connection>(
    session: &mut WatchSession<C>,
    event: Event,
) -> Result<Option<Coordinates>, Error> {
    let (next, effects) = transition(session.state, &session.vehicle_id, &event);
    session.state = next;

    let mut recorded = None;

    for effect in effects {
        match effect {
            Effect::SendSubscribe => {
                let message = json!({ "type": "subscribe", "vehicleId": session.vehicle_id });
                session.conn.send(message.to_string()).await?;
            }
            Effect::RecordFix(fix) => {
                session.last_fix = Some(fix);
                recorded = Some(fix);
            }
        }
    }

    Ok(recorded)
}

#[cfg(test)]
mod support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    pub struct ScriptedConnection {
        frames: VecDeque<String>,
        open: Arc<AtomicUsize>,
        pub sent: Arc<Mutex<Vec<String>>>,
        closed: bool,
    }

    /// Hands out connections that replay scripted frame sequences and
    /// counts how many are open at any moment.
    pub struct ScriptedConnector {
        scripts: Mutex<VecDeque<Vec<String>>>,
        pub open: Arc<AtomicUsize>,
        pub sent: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedConnector {
        pub fn new(scripts: Vec<Vec<String>>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into_iter().collect()),
                open: Arc::new(AtomicUsize::new(0)),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        type Conn = ScriptedConnection;

        async fn connect(&self, _url: &str) -> Result<Self::Conn, Error> {
            let frames = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .expect("no script left for this connection");

            self.open.fetch_add(1, Ordering::SeqCst);

            Ok(ScriptedConnection {
                frames: frames.into_iter().collect(),
                open: self.open.clone(),
                sent: self.sent.clone(),
                closed: false,
            })
        }
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn send(&mut self, text: String) -> Result<(), Error> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String, Error>> {
            self.frames.pop_front().map(Ok)
        }

        async fn close(&mut self) -> Result<(), Error> {
            if !self.closed {
                self.closed = true;
                self.open.fetch_sub(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    impl Drop for ScriptedConnection {
        fn drop(&mut self) {
            assert!(self.closed, "connection dropped without close");
        }
    }

    pub fn fix_message(vehicle_id: &str, lat: f64, lon: f64) -> String {
        format!(
            r#"{{"success":true,"data":{{"vehicleId":"{}","lat":{},"lon":{}}}}}"#,
            vehicle_id, lat, lon
        )
    }
}

#[test]
fn switching_vehicles_keeps_one_connection() {
    use std::sync::atomic::Ordering;
    use support::{fix_message, ScriptedConnector};
    use tokio_test::block_on;

    let connector = ScriptedConnector::new(vec![
        vec![fix_message("A", 20.17, -98.05)],
        vec![fix_message("B", 20.18, -98.06)],
    ]);
    let open = connector.open.clone();
    let sent = connector.sent.clone();

    let mut manager = SubscriptionManager::new(connector, "ws://localhost:4000".into());

    block_on(manager.watch("A")).unwrap();
    assert_eq!(open.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state(), WatchState::AwaitingFirstFix);

    block_on(manager.watch("B")).unwrap();
    assert_eq!(open.load(Ordering::SeqCst), 1);
    assert_eq!(manager.watched_vehicle(), Some("B"));

    let subscribes = sent.lock().unwrap();
    assert_eq!(subscribes.len(), 2);
    assert!(subscribes[1].contains(r#""vehicleId":"B""#));
    drop(subscribes);

    block_on(manager.release());
    assert_eq!(open.load(Ordering::SeqCst), 0);
    assert_eq!(manager.state(), WatchState::Idle);
}

#[test]
fn stale_messages_never_update_state_after_switch() {
    use support::{fix_message, ScriptedConnector};
    use tokio_test::block_on;

    // after switching to B, an in-flight message for A arrives first
    let connector = ScriptedConnector::new(vec![
        vec![],
        vec![
            fix_message("A", 10.0, 10.0),
            fix_message("B", 20.18, -98.06),
        ],
    ]);

    let mut manager = SubscriptionManager::new(connector, "ws://localhost:4000".into());

    block_on(manager.watch("A")).unwrap();
    block_on(manager.watch("B")).unwrap();

    let fix = block_on(manager.next_fix()).unwrap();
    assert_eq!(
        fix,
        Coordinates {
            latitude: 20.18,
            longitude: -98.06,
        }
    );
    assert_eq!(manager.last_fix(), Some(fix));
    assert_eq!(manager.state(), WatchState::Subscribed);

    block_on(manager.release());
}

#[test]
fn out_of_range_fix_is_skipped() {
    use support::{fix_message, ScriptedConnector};
    use tokio_test::block_on;

    let connector = ScriptedConnector::new(vec![vec![
        fix_message("A", 123.0, -98.05),
        fix_message("A", 20.17, -98.05),
    ]]);

    let mut manager = SubscriptionManager::new(connector, "ws://localhost:4000".into());

    block_on(manager.watch("A")).unwrap();

    let fix = block_on(manager.next_fix()).unwrap();
    assert_eq!(fix.latitude, 20.17);

    block_on(manager.release());
}

#[test]
fn peer_close_ends_the_session_cleanly() {
    use std::sync::atomic::Ordering;
    use support::ScriptedConnector;
    use tokio_test::block_on;

    let connector = ScriptedConnector::new(vec![vec![]]);
    let open = connector.open.clone();

    let mut manager = SubscriptionManager::new(connector, "ws://localhost:4000".into());

    block_on(manager.watch("A")).unwrap();
    assert_eq!(block_on(manager.next_fix()), None);

    // the connection was released on the way out
    assert_eq!(open.load(Ordering::SeqCst), 0);
    assert_eq!(manager.state(), WatchState::Idle);
}
