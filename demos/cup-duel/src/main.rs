//! Cup Duel: the rules collaborator for the cup board game, wired to a
//! Copa coordinator.
//!
//! Two players each own six cups (two small, two medium, two large) and
//! take turns placing them on a 3x3 board. A larger cup may cover a
//! smaller one. The coordinator decides whose turn it is; everything on
//! this side — board shape, cup sizes, what a move does — is ours.

use copa::prelude::*;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

struct CupRules;

impl Rules for CupRules {
    fn initial_payload() -> OpaquePayload {
        let mut payload = OpaquePayload::new();
        payload.insert(
            "board".into(),
            json!([
                [null, null, null],
                [null, null, null],
                [null, null, null]
            ]),
        );
        payload.insert("player1Cups".into(), starting_cups("1"));
        payload.insert("player2Cups".into(), starting_cups("2"));
        payload
    }

    fn apply_move(
        state: &GameState,
        seat: SeatId,
        payload: &OpaquePayload,
    ) -> GameState {
        let mut next = state.clone();

        let Some(placement) = Placement::parse(payload) else {
            // Unintelligible move: state stands, the mover keeps the turn.
            return next;
        };

        if place_cup(&mut next.payload, seat, &placement) {
            next.current_turn = seat.other();
        }
        next
    }
}

/// A requested cup placement, as sent by the client.
struct Placement {
    row: usize,
    col: usize,
    cup: usize,
}

impl Placement {
    fn parse(payload: &OpaquePayload) -> Option<Self> {
        let row = payload.get("row")?.as_u64()? as usize;
        let col = payload.get("col")?.as_u64()? as usize;
        let cup = payload.get("cup")?.as_u64()? as usize;
        (row < 3 && col < 3).then_some(Self { row, col, cup })
    }
}

fn starting_cups(player: &str) -> Value {
    json!([
        { "size": "small",  "player": player },
        { "size": "small",  "player": player },
        { "size": "medium", "player": player },
        { "size": "medium", "player": player },
        { "size": "large",  "player": player },
        { "size": "large",  "player": player },
    ])
}

fn size_rank(size: &str) -> u8 {
    match size {
        "small" => 1,
        "medium" => 2,
        "large" => 3,
        _ => 0,
    }
}

fn cups_key(seat: SeatId) -> &'static str {
    match seat {
        SeatId::One => "player1Cups",
        SeatId::Two => "player2Cups",
    }
}

/// Places one of `seat`'s remaining cups. Returns `false` (leaving the
/// payload untouched) when the cup index is stale or the target cell
/// holds an equal or larger cup.
fn place_cup(
    payload: &mut OpaquePayload,
    seat: SeatId,
    placement: &Placement,
) -> bool {
    let Some(cup) = payload
        .get(cups_key(seat))
        .and_then(Value::as_array)
        .and_then(|cups| cups.get(placement.cup))
        .cloned()
    else {
        return false;
    };

    let target = &payload["board"][placement.row][placement.col];
    if let Some(occupant) = target.as_object() {
        let standing = occupant
            .get("size")
            .and_then(Value::as_str)
            .map_or(0, size_rank);
        let incoming = cup
            .get("size")
            .and_then(Value::as_str)
            .map_or(0, size_rank);
        if incoming <= standing {
            return false;
        }
    }

    if let Some(cups) = payload
        .get_mut(cups_key(seat))
        .and_then(Value::as_array_mut)
    {
        cups.remove(placement.cup);
    }
    payload["board"][placement.row][placement.col] = cup;
    true
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "starting cup-duel coordinator");

    let server = CopaServerBuilder::new()
        .bind(&addr)
        .build::<CupRules>()
        .await?;
    server.run().await?;
    Ok(())
}
