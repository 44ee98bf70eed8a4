use serde::Deserialize;

use crate::entities::Coordinates;
use crate::error::Error;

/// Lifecycle of a watch session. AwaitingFirstFix means subscribed but
/// without a position yet, which the view renders as a waiting
/// indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Connecting,
    Subscribed,
    AwaitingFirstFix,
    Closed,
}

/// Everything the connection can report, as a tagged union.
#[derive(Debug)]
pub enum Event {
    Opened,
    MessageReceived(String),
    Errored(Error),
    Closed,
}

/// Side effects the manager must carry out after a transition.
#[derive(Debug, PartialEq)]
pub enum Effect {
    SendSubscribe,
    RecordFix(Coordinates),
}

#[derive(Debug, Deserialize)]
struct PositionMessage {
    success: bool,
    data: PositionData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionData {
    vehicle_id: String,
    lat: f64,
    lon: f64,
}

/// The whole event handling of a watch session as one pure step:
/// (state, event) -> (next state, effects). Messages for any vehicle
/// other than `vehicle_id` are discarded, as are fixes outside valid
/// coordinate ranges.
pub fn transition(state: WatchState, vehicle_id: &str, event: &Event) -> (WatchState, Vec<Effect>) {
    match (state, event) {
        (WatchState::Connecting, Event::Opened) => {
            (WatchState::AwaitingFirstFix, vec![Effect::SendSubscribe])
        }
        (WatchState::AwaitingFirstFix | WatchState::Subscribed, Event::MessageReceived(raw)) => {
            match parse_fix(vehicle_id, raw) {
                Some(fix) => (WatchState::Subscribed, vec![Effect::RecordFix(fix)]),
                None => (state, Vec::new()),
            }
        }
        (_, Event::Errored(err)) => {
            tracing::warn!(?err, "watch connection errored");
            (WatchState::Closed, Vec::new())
        }
        (_, Event::Closed) => (WatchState::Closed, Vec::new()),
        _ => (state, Vec::new()),
    }
}

fn parse_fix(vehicle_id: &str, raw: &str) -> Option<Coordinates> {
    let message: PositionMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!(?err, "malformed position message");
            return None;
        }
    };

    if !message.success || message.data.vehicle_id != vehicle_id {
        // stale message from a previous subscription, or a server miss
        return None;
    }

    let fix = Coordinates {
        latitude: message.data.lat,
        longitude: message.data.lon,
    };

    if !fix.in_range() {
        tracing::warn!(?fix, "position fix out of range");
        return None;
    }

    Some(fix)
}

#[cfg(test)]
fn fix_message(vehicle_id: &str, lat: f64, lon: f64) -> String {
    format!(
        r#"{{"success":true,"data":{{"vehicleId":"{}","lat":{},"lon":{}}}}}"#,
        vehicle_id, lat, lon
    )
}

#[test]
fn opened_connection_sends_subscribe() {
    let (state, effects) = transition(WatchState::Connecting, "A", &Event::Opened);

    assert_eq!(state, WatchState::AwaitingFirstFix);
    assert_eq!(effects, vec![Effect::SendSubscribe]);
}

#[test]
fn first_fix_moves_to_subscribed() {
    let raw = fix_message("A", 20.17, -98.05);
    let (state, effects) = transition(
        WatchState::AwaitingFirstFix,
        "A",
        &Event::MessageReceived(raw),
    );

    assert_eq!(state, WatchState::Subscribed);
    assert_eq!(
        effects,
        vec![Effect::RecordFix(Coordinates {
            latitude: 20.17,
            longitude: -98.05,
        })]
    );
}

#[test]
fn stale_vehicle_message_is_discarded() {
    let raw = fix_message("A", 20.17, -98.05);
    let (state, effects) = transition(WatchState::Subscribed, "B", &Event::MessageReceived(raw));

    assert_eq!(state, WatchState::Subscribed);
    assert!(effects.is_empty());
}

#[test]
fn out_of_range_fix_is_discarded() {
    let raw = fix_message("A", 123.0, -98.05);
    let (state, effects) = transition(
        WatchState::AwaitingFirstFix,
        "A",
        &Event::MessageReceived(raw),
    );

    assert_eq!(state, WatchState::AwaitingFirstFix);
    assert!(effects.is_empty());
}

#[test]
fn malformed_message_is_discarded() {
    let (state, effects) = transition(
        WatchState::Subscribed,
        "A",
        &Event::MessageReceived("not json".into()),
    );

    assert_eq!(state, WatchState::Subscribed);
    assert!(effects.is_empty());
}

#[test]
fn errors_and_closure_end_the_session() {
    let (state, effects) = transition(
        WatchState::Subscribed,
        "A",
        &Event::Errored(crate::error::upstream_error()),
    );
    assert_eq!(state, WatchState::Closed);
    assert!(effects.is_empty());

    let (state, _) = transition(WatchState::AwaitingFirstFix, "A", &Event::Closed);
    assert_eq!(state, WatchState::Closed);
}
