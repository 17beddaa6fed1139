//! Wire event types for the Mesa broker.
//!
//! The JSON shapes here are fixed by the existing truco client: snake_case
//! `"event"` tags, camelCase payload fields, room ids as `"room_N"`
//! strings, and seat state as a 4-entry array with `null` for empty
//! seats. Changing any of these breaks deployed clients, which is why
//! the serde tests below pin the exact output.

use std::fmt;
use std::str::FromStr;

use mesa_transport::ConnectionId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ProtocolError;

/// Number of seats at a table. Truco is played four-handed.
pub const SEAT_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// A room identifier, numeric 1..=10.
///
/// Newtype over `u8` for type safety, but the wire form is the string
/// `"room_N"` — that is what the original protocol used and what the
/// client matches on. `Display` prints the same form so log lines and
/// wire payloads agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(pub u8);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room_{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("room_")
            .and_then(|n| n.parse::<u8>().ok())
            .map(RoomId)
            .ok_or_else(|| {
                ProtocolError::InvalidRoomId(s.to_string())
            })
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// One occupied seat, as broadcast in `update_players` and `room_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    /// The seated participant's connection handle.
    pub id: ConnectionId,
    /// Client-asserted display name. Untrusted.
    pub name: String,
    /// Client-asserted avatar. Untrusted.
    pub avatar_id: u32,
    /// The seat index this participant occupies.
    pub slot: usize,
}

/// Seat state for a whole table: `null` per empty seat on the wire.
pub type SeatMap = [Option<SeatView>; SEAT_COUNT];

/// One row of the global room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// The room id, `"room_N"` on the wire.
    pub id: RoomId,
    /// Human-facing table name.
    pub name: String,
    /// Seated participants only — spectators don't count.
    pub count: usize,
    /// `count >= 4`; the client greys out full tables.
    pub full: bool,
}

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// Every event a client can send.
///
/// Internally tagged: `{ "event": "sit_down", "roomId": "room_1",
/// "slot": 2 }`. The relay variants close over the known game-action
/// kinds but leave their payloads opaque — `#[serde(flatten)]` scoops
/// every field other than the tag into a raw [`serde_json::Value`] so
/// the broker can re-emit it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Create a table; the creator still has to `join_room` afterwards.
    #[serde(rename_all = "camelCase")]
    CreateRoom { player_name: String },

    /// Enter a room's roster as an (unseated) spectator.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: RoomId,
        player_name: String,
        avatar_id: u32,
    },

    /// Take a seat at the table.
    #[serde(rename_all = "camelCase")]
    SitDown { room_id: RoomId, slot: usize },

    /// Stand up but stay in the room as a spectator.
    #[serde(rename_all = "camelCase")]
    LeaveSeat { room_id: RoomId },

    /// Start the round. Only honored with all four seats taken.
    #[serde(rename_all = "camelCase")]
    RequestStartGame { room_id: RoomId },

    /// Game action: deal. Payload opaque to the broker.
    DistribuirCartas {
        #[serde(flatten)]
        data: serde_json::Value,
    },

    /// Game action: play a card. Payload opaque to the broker.
    JogarCarta {
        #[serde(flatten)]
        data: serde_json::Value,
    },

    /// Game action: truco call/response. Payload opaque to the broker.
    TrucoAction {
        #[serde(flatten)]
        data: serde_json::Value,
    },
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// Every event the broker can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full directory snapshot. Global: every connection gets it, both
    /// on connect and whenever any room's row changes.
    RoomListUpdate { rooms: Vec<RoomSummary> },

    /// Reply to `create_room`, sender only.
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: RoomId },

    /// Reply to `join_room`, sender only: the room as it stands, plus
    /// the handle the client should recognize itself by in seat views.
    #[serde(rename_all = "camelCase")]
    RoomState {
        room_id: RoomId,
        room_name: String,
        seats: SeatMap,
        self_handle: ConnectionId,
    },

    /// Advisory failure notice for room operations, sender only.
    RoomError { message: String },

    /// Advisory failure notice for `sit_down`, sender only.
    SitError { message: String },

    /// Seat state changed; sent to the whole room.
    UpdatePlayers { seats: SeatMap },

    /// A seated participant left mid-game. Informational only — the
    /// broker does not decide whether the round is aborted.
    PlayerDisco { slot: usize, name: String },

    /// All four seats filled and someone asked to start.
    RemoteGameStart,

    /// Relayed deal, to every room member except the sender.
    RemoteDistribuirCartas {
        #[serde(flatten)]
        data: serde_json::Value,
    },

    /// Relayed card play, to every room member except the sender.
    RemoteJogarCarta {
        #[serde(flatten)]
        data: serde_json::Value,
    },

    /// Relayed truco call, to every room member except the sender.
    RemoteTrucoAction {
        #[serde(flatten)]
        data: serde_json::Value,
    },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Shape tests pinning the exact JSON the deployed client speaks.

    use super::*;
    use serde_json::json;

    // =====================================================================
    // RoomId
    // =====================================================================

    #[test]
    fn test_room_id_serializes_as_room_n_string() {
        let json = serde_json::to_string(&RoomId(1)).unwrap();
        assert_eq!(json, "\"room_1\"");
    }

    #[test]
    fn test_room_id_deserializes_from_room_n_string() {
        let id: RoomId = serde_json::from_str("\"room_7\"").unwrap();
        assert_eq!(id, RoomId(7));
    }

    #[test]
    fn test_room_id_display_matches_wire_form() {
        assert_eq!(RoomId(3).to_string(), "room_3");
    }

    #[test]
    fn test_room_id_rejects_malformed_strings() {
        assert!(serde_json::from_str::<RoomId>("\"room_\"").is_err());
        assert!(serde_json::from_str::<RoomId>("\"sala_1\"").is_err());
        assert!(serde_json::from_str::<RoomId>("\"room_x\"").is_err());
        assert!(serde_json::from_str::<RoomId>("1").is_err());
    }

    #[test]
    fn test_room_id_from_str_round_trip() {
        let id: RoomId = "room_10".parse().unwrap();
        assert_eq!(id, RoomId(10));
        assert_eq!(id.to_string().parse::<RoomId>().unwrap(), id);
    }

    // =====================================================================
    // Inbound events
    // =====================================================================

    #[test]
    fn test_create_room_json_shape() {
        let ev: ClientEvent = serde_json::from_value(json!({
            "event": "create_room",
            "playerName": "Zeca"
        }))
        .unwrap();
        assert_eq!(
            ev,
            ClientEvent::CreateRoom {
                player_name: "Zeca".into()
            }
        );
    }

    #[test]
    fn test_join_room_json_shape() {
        let ev: ClientEvent = serde_json::from_value(json!({
            "event": "join_room",
            "roomId": "room_2",
            "playerName": "Maria",
            "avatarId": 5
        }))
        .unwrap();
        assert_eq!(
            ev,
            ClientEvent::JoinRoom {
                room_id: RoomId(2),
                player_name: "Maria".into(),
                avatar_id: 5,
            }
        );
    }

    #[test]
    fn test_sit_down_json_shape() {
        let ev: ClientEvent = serde_json::from_value(json!({
            "event": "sit_down",
            "roomId": "room_1",
            "slot": 2
        }))
        .unwrap();
        assert_eq!(
            ev,
            ClientEvent::SitDown {
                room_id: RoomId(1),
                slot: 2
            }
        );
    }

    #[test]
    fn test_relay_event_captures_arbitrary_payload() {
        let ev: ClientEvent = serde_json::from_value(json!({
            "event": "jogar_carta",
            "carta": { "valor": "3", "naipe": "espadas" },
            "roomId": "room_1"
        }))
        .unwrap();

        match ev {
            ClientEvent::JogarCarta { data } => {
                assert_eq!(data["carta"]["naipe"], "espadas");
                assert_eq!(data["roomId"], "room_1");
            }
            other => panic!("expected JogarCarta, got {other:?}"),
        }
    }

    #[test]
    fn test_relay_event_with_no_extra_fields() {
        let ev: ClientEvent = serde_json::from_value(json!({
            "event": "truco_action"
        }))
        .unwrap();
        match ev {
            ClientEvent::TrucoAction { data } => {
                assert_eq!(data, json!({}));
            }
            other => panic!("expected TrucoAction, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_tag_is_rejected() {
        let result: Result<ClientEvent, _> = serde_json::from_value(json!({
            "event": "fly_to_moon",
            "speed": 9000
        }));
        assert!(result.is_err());
    }

    // =====================================================================
    // Outbound events
    // =====================================================================

    #[test]
    fn test_room_created_json_shape() {
        let v = serde_json::to_value(ServerEvent::RoomCreated {
            room_id: RoomId(1),
        })
        .unwrap();
        assert_eq!(v, json!({ "event": "room_created", "roomId": "room_1" }));
    }

    #[test]
    fn test_room_list_update_json_shape() {
        let v = serde_json::to_value(ServerEvent::RoomListUpdate {
            rooms: vec![RoomSummary {
                id: RoomId(1),
                name: "Mesa 1".into(),
                count: 3,
                full: false,
            }],
        })
        .unwrap();
        assert_eq!(v["event"], "room_list_update");
        assert_eq!(v["rooms"][0]["id"], "room_1");
        assert_eq!(v["rooms"][0]["count"], 3);
        assert_eq!(v["rooms"][0]["full"], false);
    }

    #[test]
    fn test_room_state_json_shape() {
        let mut seats: SeatMap = Default::default();
        seats[1] = Some(SeatView {
            id: ConnectionId::new(9),
            name: "Zeca".into(),
            avatar_id: 2,
            slot: 1,
        });
        let v = serde_json::to_value(ServerEvent::RoomState {
            room_id: RoomId(4),
            room_name: "Mesa 4".into(),
            seats,
            self_handle: ConnectionId::new(9),
        })
        .unwrap();

        assert_eq!(v["event"], "room_state");
        assert_eq!(v["roomId"], "room_4");
        assert_eq!(v["roomName"], "Mesa 4");
        assert_eq!(v["selfHandle"], 9);
        assert!(v["seats"][0].is_null());
        assert_eq!(v["seats"][1]["name"], "Zeca");
        assert_eq!(v["seats"][1]["avatarId"], 2);
        assert_eq!(v["seats"][1]["slot"], 1);
    }

    #[test]
    fn test_update_players_empty_table() {
        let v = serde_json::to_value(ServerEvent::UpdatePlayers {
            seats: Default::default(),
        })
        .unwrap();
        assert_eq!(v["seats"], json!([null, null, null, null]));
    }

    #[test]
    fn test_player_disco_json_shape() {
        let v = serde_json::to_value(ServerEvent::PlayerDisco {
            slot: 2,
            name: "Maria".into(),
        })
        .unwrap();
        assert_eq!(
            v,
            json!({ "event": "player_disco", "slot": 2, "name": "Maria" })
        );
    }

    #[test]
    fn test_remote_game_start_is_bare_tag() {
        let v = serde_json::to_value(ServerEvent::RemoteGameStart).unwrap();
        assert_eq!(v, json!({ "event": "remote_game_start" }));
    }

    #[test]
    fn test_relayed_payload_is_verbatim() {
        // Decode an inbound action, re-wrap it as remote, and check the
        // payload fields come out untouched.
        let inbound: ClientEvent = serde_json::from_value(json!({
            "event": "distribuir_cartas",
            "maos": [[1, 2, 3], [4, 5, 6]],
            "vira": 7
        }))
        .unwrap();

        let data = match inbound {
            ClientEvent::DistribuirCartas { data } => data,
            other => panic!("expected DistribuirCartas, got {other:?}"),
        };

        let v = serde_json::to_value(ServerEvent::RemoteDistribuirCartas {
            data,
        })
        .unwrap();
        assert_eq!(v["event"], "remote_distribuir_cartas");
        assert_eq!(v["maos"], json!([[1, 2, 3], [4, 5, 6]]));
        assert_eq!(v["vira"], 7);
    }
}
