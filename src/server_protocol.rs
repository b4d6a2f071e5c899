use serde_json::Value;

use crate::types::CharacterId;
use crate::world::normalize_key;

const MAX_KEY_LEN: usize = 16;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    KeyDown { key: String },
    KeyUp { key: String },
    SwitchCharacter { slot: usize, character: CharacterId },
    Restart { characters: Option<[CharacterId; 2]> },
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "key_down" => Some(ParsedClientMessage::KeyDown {
            key: parse_key(object.get("key")?)?,
        }),
        "key_up" => Some(ParsedClientMessage::KeyUp {
            key: parse_key(object.get("key")?)?,
        }),
        "switch_character" => {
            let slot = object.get("player")?.as_u64()?;
            if slot > 1 {
                return None;
            }
            let character = CharacterId::parse(object.get("character")?.as_str()?)?;
            Some(ParsedClientMessage::SwitchCharacter {
                slot: slot as usize,
                character,
            })
        }
        "restart" => {
            let characters = match object.get("characters") {
                None => None,
                Some(value) => {
                    let list = value.as_array()?;
                    if list.len() != 2 {
                        return None;
                    }
                    let first = CharacterId::parse(list[0].as_str()?)?;
                    let second = CharacterId::parse(list[1].as_str()?)?;
                    Some([first, second])
                }
            };
            Some(ParsedClientMessage::Restart { characters })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_key(value: &Value) -> Option<String> {
    let key = value.as_str()?;
    if key.is_empty() || key.chars().count() > MAX_KEY_LEN {
        return None;
    }
    Some(normalize_key(key))
}
