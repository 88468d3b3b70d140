use serde::{Deserialize, Serialize};

use super::messages::{
    ClientMessage, ErrorMsg, GameOverMsg, GameStartMsg, JoinRoomMsg, MessageType, NewTurnMsg,
    PlacementTimerMsg, RoomCreatedMsg, ServerMessage, ShootMsg, ShotResultMsg, SubmitPlacementMsg,
};

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::CreateRoom => encode_message(MessageType::CreateRoom, &()),
        ClientMessage::JoinRoom(m) => encode_message(MessageType::JoinRoom, m),
        ClientMessage::SubmitPlacement(m) => encode_message(MessageType::SubmitPlacement, m),
        ClientMessage::Shoot(m) => encode_message(MessageType::Shoot, m),
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    let msg_type = msg.message_type();
    match msg {
        ServerMessage::RoomCreated(m) => encode_message(msg_type, m),
        ServerMessage::Error(m) => encode_message(msg_type, m),
        ServerMessage::GameStart(m) => encode_message(msg_type, m),
        ServerMessage::PlacementTimerStarted(m) => encode_message(msg_type, m),
        ServerMessage::NewTurn(m) => encode_message(msg_type, m),
        ServerMessage::ShotResult(m) => encode_message(msg_type, m),
        ServerMessage::GameOver(m) => encode_message(msg_type, m),
        ServerMessage::OpponentReady
        | ServerMessage::ShootingPhaseStart
        | ServerMessage::OpponentLeft => encode_message(msg_type, &()),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(data.len()));
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ClientMessage`.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::CreateRoom => Ok(ClientMessage::CreateRoom),
        MessageType::JoinRoom => Ok(ClientMessage::JoinRoom(decode_payload::<JoinRoomMsg>(
            data,
        )?)),
        MessageType::SubmitPlacement => Ok(ClientMessage::SubmitPlacement(decode_payload::<
            SubmitPlacementMsg,
        >(data)?)),
        MessageType::Shoot => Ok(ClientMessage::Shoot(decode_payload::<ShootMsg>(data)?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::RoomCreated => Ok(ServerMessage::RoomCreated(decode_payload::<
            RoomCreatedMsg,
        >(data)?)),
        MessageType::Error => Ok(ServerMessage::Error(decode_payload::<ErrorMsg>(data)?)),
        MessageType::GameStart => Ok(ServerMessage::GameStart(decode_payload::<GameStartMsg>(
            data,
        )?)),
        MessageType::PlacementTimerStarted => Ok(ServerMessage::PlacementTimerStarted(
            decode_payload::<PlacementTimerMsg>(data)?,
        )),
        MessageType::OpponentReady => Ok(ServerMessage::OpponentReady),
        MessageType::ShootingPhaseStart => Ok(ServerMessage::ShootingPhaseStart),
        MessageType::NewTurn => Ok(ServerMessage::NewTurn(decode_payload::<NewTurnMsg>(data)?)),
        MessageType::ShotResult => Ok(ServerMessage::ShotResult(decode_payload::<
            ShotResultMsg,
        >(data)?)),
        MessageType::GameOver => Ok(ServerMessage::GameOver(decode_payload::<GameOverMsg>(
            data,
        )?)),
        MessageType::OpponentLeft => Ok(ServerMessage::OpponentLeft),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}
