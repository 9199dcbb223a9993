//! Commands and events used throughout layout-remote.
//!
//! [`Command`] is the vocabulary of user intent delivered by the UI: a
//! finished drag, a step of a numeric control, or a tag edit.  [`Event`]
//! is what the event sources feed into the main loop: commands, inbound
//! frames from the authority and connection lifecycle notifications.
//!
//! Steps accept a few wire forms (an integer, a numeric string, or a raw
//! wheel delta) and are normalised here.

use crate::bounds::wheel_step;
use crate::drag::DragResult;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A signed step for a bounded control.
///
/// Wire forms: `-1`, `"1"`, or `{"wheel": 120.0}` where only the sign of
/// the wheel delta counts (wheel down decrements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step(pub i32);

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Step;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "integer, integer string, or {{\"wheel\": delta}}")
            }
            fn visit_i64<E>(self, n: i64) -> Result<Step, E>
            where
                E: DeError,
            {
                i32::try_from(n)
                    .map(Step)
                    .map_err(|_| DeError::custom(format!("step {} out of range", n)))
            }
            fn visit_u64<E>(self, n: u64) -> Result<Step, E>
            where
                E: DeError,
            {
                i32::try_from(n)
                    .map(Step)
                    .map_err(|_| DeError::custom(format!("step {} out of range", n)))
            }
            fn visit_str<E>(self, s: &str) -> Result<Step, E>
            where
                E: DeError,
            {
                s.trim()
                    .parse()
                    .map(Step)
                    .map_err(|_| DeError::custom(format!("invalid step: {:?}", s)))
            }
            fn visit_map<A>(self, mut map: A) -> Result<Step, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut wheel: Option<f64> = None;
                while let Some(k) = map.next_key::<String>()? {
                    match k.as_str() {
                        "wheel" => wheel = Some(map.next_value()?),
                        _ => {
                            let _: serde::de::IgnoredAny = map.next_value()?;
                        }
                    }
                }
                let delta_y = wheel.ok_or_else(|| DeError::missing_field("wheel"))?;
                Ok(Step(wheel_step(delta_y)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Every edit the UI can request.
///
/// Commands arrive from an [`EventSource`](crate::traits::EventSource) and
/// are applied by the [`SyncChannel`](crate::sync::SyncChannel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// A finished drag-and-drop gesture.
    Drag(DragResult),

    /// Step an output's `max_views`, clamped to `[1, 8]`.
    StepMaxViews { output: String, delta: Step },

    /// Step a workspace's `top_k`, clamped to `[-1, 3]`.
    StepTopK { workspace: String, delta: Step },

    /// Commit text from the tag input of a view.  Surrounding whitespace is
    /// trimmed; blank text is ignored.
    AddTag { view: String, text: String },

    /// Remove a tag from a view.
    RemoveTag { view: String, tag: String },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Drag(d) => write!(
                f,
                "drag {:?} from {}[{}]",
                d.kind, d.source.droppable_id, d.source.index
            ),
            Command::StepMaxViews { output, delta } => {
                write!(f, "step max_views of {} by {}", output, delta.0)
            }
            Command::StepTopK { workspace, delta } => {
                write!(f, "step top_k of workspace {} by {}", workspace, delta.0)
            }
            Command::AddTag { view, text } => write!(f, "add tag {:?} to {}", text.trim(), view),
            Command::RemoveTag { view, tag } => write!(f, "remove tag {:?} from {}", tag, view),
        }
    }
}

/// Input to the main event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A user command from the UI.
    Command(Command),
    /// One text frame received from the authority.
    Inbound(String),
    /// The connection to the authority is ready for sends.
    ConnectionOpened,
    /// The connection to the authority is gone.
    ConnectionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragKind;

    #[test]
    fn step_from_integers_and_strings() {
        let s: Step = serde_json::from_str("-1").unwrap();
        assert_eq!(s, Step(-1));
        let s: Step = serde_json::from_str("1").unwrap();
        assert_eq!(s, Step(1));
        let s: Step = serde_json::from_str(r#"" -2 ""#).unwrap();
        assert_eq!(s, Step(-2));
    }

    #[test]
    fn step_from_wheel_uses_sign() {
        let s: Step = serde_json::from_str(r#"{"wheel": 53.0}"#).unwrap();
        assert_eq!(s, Step(-1));
        let s: Step = serde_json::from_str(r#"{"wheel": -0.5, "mode": 0}"#).unwrap();
        assert_eq!(s, Step(1));
    }

    #[test]
    fn step_rejects_garbage() {
        assert!(serde_json::from_str::<Step>(r#""up""#).is_err());
        assert!(serde_json::from_str::<Step>("4294967296").is_err());
        assert!(serde_json::from_str::<Step>(r#"{"x": 1}"#).is_err());
    }

    #[test]
    fn commands_parse_from_wire() {
        let cmd: Command =
            serde_json::from_str(r#"{"StepMaxViews":{"output":"HDMI-2","delta":{"wheel":3}}}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::StepMaxViews {
                output: "HDMI-2".into(),
                delta: Step(-1)
            }
        );

        let cmd: Command =
            serde_json::from_str(r#"{"AddTag":{"view":"v1","text":" web "}}"#).unwrap();
        assert_eq!(
            cmd,
            Command::AddTag {
                view: "v1".into(),
                text: " web ".into()
            }
        );

        let cmd: Command = serde_json::from_str(
            r#"{"Drag":{"type":"workspace","source":{"droppableId":"workspaces","index":1},"destination":null}}"#,
        )
        .unwrap();
        match cmd {
            Command::Drag(d) => {
                assert_eq!(d.kind, DragKind::Workspace);
                assert!(d.destination.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn command_display() {
        let cmd = Command::StepTopK {
            workspace: "3".into(),
            delta: Step(1),
        };
        assert_eq!(cmd.to_string(), "step top_k of workspace 3 by 1");
        let cmd = Command::AddTag {
            view: "v1".into(),
            text: "  x ".into(),
        };
        assert_eq!(cmd.to_string(), "add tag \"x\" to v1");
    }
}
