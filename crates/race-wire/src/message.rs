//! UDP frame layout: `[magic u32 = 0x52414345 "RACE"][msg_type u16][body]`.
//! Every message type round-trips through a `DataBuf` at a fixed offset
//! convention so the server can compose one frame per client into a
//! shared, reused buffer.

use crate::databuf::DataBuf;
use crate::error::ProtocolError;

pub const MAGIC: u32 = 0x5241_4345; // "RACE"

pub const MSG_CLIENT_REQUEST: u16 = 1;
pub const MSG_SERVER_ACCEPT: u16 = 2;
pub const MSG_SERVER_REJECT: u16 = 3;
pub const MSG_DATA: u16 = 4;
pub const MSG_STOP: u16 = 5;

pub const PAYLOAD_TRACK: u16 = 1;
pub const PAYLOAD_PROXIMITY: u16 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientRequest {
    pub flags: i32,
    pub schema: String,
    pub sim_time_epoch_millis: i64,
    pub interval_millis: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerAccept {
    pub server_flags: i32,
    pub sim_time_epoch_millis: i64,
    pub effective_interval_millis: i32,
    pub assigned_client_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerReject {
    pub reason_code: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub id: String,
    pub msg_ord: i32,
    pub flags: i32,
    pub time_epoch_millis: i64,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    pub heading_deg: f64,
    pub speed_mps: f64,
    pub vertical_rate_mps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityPair {
    pub ref_id: u32,
    pub target_id: u32,
    pub distance_m: f64,
    pub flags: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    Track(Vec<TrackRecord>),
    Proximity(Vec<ProximityPair>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub sender_id: u32,
    pub send_time_epoch_millis: i64,
    pub payload: DataPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ClientRequest(ClientRequest),
    ServerAccept(ServerAccept),
    ServerReject(ServerReject),
    Data(DataMessage),
    Stop,
}

fn write_header(buf: &mut DataBuf, msg_type: u16) -> Result<usize, ProtocolError> {
    let pos = buf.write_uint(0, MAGIC)?;
    buf.write_short(pos, msg_type)
}

fn read_header(buf: &DataBuf, filled: usize) -> Result<(u16, usize), ProtocolError> {
    let (magic, pos) = buf.read_uint(0, filled)?;
    if magic != MAGIC {
        return Err(ProtocolError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    buf.read_short(pos, filled)
}

impl Message {
    /// Encode into `buf`, returning the number of bytes written (the frame
    /// length, i.e. the new `pos`).
    pub fn encode(&self, buf: &mut DataBuf) -> Result<usize, ProtocolError> {
        match self {
            Message::ClientRequest(req) => {
                let pos = write_header(buf, MSG_CLIENT_REQUEST)?;
                let pos = buf.write_int(pos, req.flags)?;
                let pos = buf.write_string(pos, &req.schema)?;
                let pos = buf.write_long(pos, req.sim_time_epoch_millis)?;
                buf.write_int(pos, req.interval_millis)
            }
            Message::ServerAccept(acc) => {
                let pos = write_header(buf, MSG_SERVER_ACCEPT)?;
                let pos = buf.write_int(pos, acc.server_flags)?;
                let pos = buf.write_long(pos, acc.sim_time_epoch_millis)?;
                let pos = buf.write_int(pos, acc.effective_interval_millis)?;
                buf.write_uint(pos, acc.assigned_client_id)
            }
            Message::ServerReject(rej) => {
                let pos = write_header(buf, MSG_SERVER_REJECT)?;
                buf.write_int(pos, rej.reason_code)
            }
            Message::Data(data) => {
                let pos = write_header(buf, MSG_DATA)?;
                let pos = buf.write_uint(pos, data.sender_id)?;
                let pos = buf.write_long(pos, data.send_time_epoch_millis)?;
                write_payload(buf, pos, &data.payload)
            }
            Message::Stop => write_header(buf, MSG_STOP),
        }
    }

    pub fn decode(buf: &DataBuf, filled: usize) -> Result<Self, ProtocolError> {
        let (msg_type, pos) = read_header(buf, filled)?;
        match msg_type {
            MSG_CLIENT_REQUEST => {
                let (flags, pos) = buf.read_int(pos, filled)?;
                let (schema, pos) = buf.read_string(pos, filled)?;
                let (sim_time_epoch_millis, pos) = buf.read_long(pos, filled)?;
                let (interval_millis, _) = buf.read_int(pos, filled)?;
                Ok(Message::ClientRequest(ClientRequest {
                    flags,
                    schema,
                    sim_time_epoch_millis,
                    interval_millis,
                }))
            }
            MSG_SERVER_ACCEPT => {
                let (server_flags, pos) = buf.read_int(pos, filled)?;
                let (sim_time_epoch_millis, pos) = buf.read_long(pos, filled)?;
                let (effective_interval_millis, pos) = buf.read_int(pos, filled)?;
                let (assigned_client_id, _) = buf.read_uint(pos, filled)?;
                Ok(Message::ServerAccept(ServerAccept {
                    server_flags,
                    sim_time_epoch_millis,
                    effective_interval_millis,
                    assigned_client_id,
                }))
            }
            MSG_SERVER_REJECT => {
                let (reason_code, _) = buf.read_int(pos, filled)?;
                Ok(Message::ServerReject(ServerReject { reason_code }))
            }
            MSG_DATA => {
                let (sender_id, pos) = buf.read_uint(pos, filled)?;
                let (send_time_epoch_millis, pos) = buf.read_long(pos, filled)?;
                let payload = read_payload(buf, pos, filled)?;
                Ok(Message::Data(DataMessage {
                    sender_id,
                    send_time_epoch_millis,
                    payload,
                }))
            }
            MSG_STOP => Ok(Message::Stop),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

fn write_track_record(buf: &mut DataBuf, pos: usize, r: &TrackRecord) -> Result<usize, ProtocolError> {
    let pos = buf.write_string(pos, &r.id)?;
    let pos = buf.write_int(pos, r.msg_ord)?;
    let pos = buf.write_int(pos, r.flags)?;
    let pos = buf.write_long(pos, r.time_epoch_millis)?;
    let pos = buf.write_double(pos, r.lat_deg)?;
    let pos = buf.write_double(pos, r.lon_deg)?;
    let pos = buf.write_double(pos, r.alt_m)?;
    let pos = buf.write_double(pos, r.heading_deg)?;
    let pos = buf.write_double(pos, r.speed_mps)?;
    buf.write_double(pos, r.vertical_rate_mps)
}

fn read_track_record(buf: &DataBuf, pos: usize, filled: usize) -> Result<(TrackRecord, usize), ProtocolError> {
    let (id, pos) = buf.read_string(pos, filled)?;
    let (msg_ord, pos) = buf.read_int(pos, filled)?;
    let (flags, pos) = buf.read_int(pos, filled)?;
    let (time_epoch_millis, pos) = buf.read_long(pos, filled)?;
    let (lat_deg, pos) = buf.read_double(pos, filled)?;
    let (lon_deg, pos) = buf.read_double(pos, filled)?;
    let (alt_m, pos) = buf.read_double(pos, filled)?;
    let (heading_deg, pos) = buf.read_double(pos, filled)?;
    let (speed_mps, pos) = buf.read_double(pos, filled)?;
    let (vertical_rate_mps, pos) = buf.read_double(pos, filled)?;
    Ok((
        TrackRecord {
            id,
            msg_ord,
            flags,
            time_epoch_millis,
            lat_deg,
            lon_deg,
            alt_m,
            heading_deg,
            speed_mps,
            vertical_rate_mps,
        },
        pos,
    ))
}

/// Writer is authoritative for `PROXIMITY_MSG` layout (spec open question
/// c): count-prefixed `{ref_id, target_id, distance_m, flags}` records.
fn write_proximity(buf: &mut DataBuf, pos: usize, pairs: &[ProximityPair]) -> Result<usize, ProtocolError> {
    let count: i32 = pairs.len().try_into().map_err(|_| ProtocolError::CapacityExceeded {
        pos,
        needed: pairs.len(),
        capacity: i32::MAX as usize,
    })?;
    let mut pos = buf.write_int(pos, count)?;
    for p in pairs {
        pos = buf.write_uint(pos, p.ref_id)?;
        pos = buf.write_uint(pos, p.target_id)?;
        pos = buf.write_double(pos, p.distance_m)?;
        pos = buf.write_int(pos, p.flags)?;
    }
    Ok(pos)
}

fn read_proximity(buf: &DataBuf, pos: usize, filled: usize) -> Result<(Vec<ProximityPair>, usize), ProtocolError> {
    let (count, mut pos) = buf.read_int(pos, filled)?;
    let mut pairs = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count.max(0) {
        let (ref_id, p) = buf.read_uint(pos, filled)?;
        let (target_id, p) = buf.read_uint(p, filled)?;
        let (distance_m, p) = buf.read_double(p, filled)?;
        let (flags, p) = buf.read_int(p, filled)?;
        pos = p;
        pairs.push(ProximityPair {
            ref_id,
            target_id,
            distance_m,
            flags,
        });
    }
    Ok((pairs, pos))
}

fn write_payload(buf: &mut DataBuf, pos: usize, payload: &DataPayload) -> Result<usize, ProtocolError> {
    match payload {
        DataPayload::Track(records) => {
            let pos = buf.write_short(pos, PAYLOAD_TRACK)?;
            let count: i32 = records.len().try_into().map_err(|_| ProtocolError::CapacityExceeded {
                pos,
                needed: records.len(),
                capacity: i32::MAX as usize,
            })?;
            let mut pos = buf.write_int(pos, count)?;
            for r in records {
                pos = write_track_record(buf, pos, r)?;
            }
            Ok(pos)
        }
        DataPayload::Proximity(pairs) => {
            let pos = buf.write_short(pos, PAYLOAD_PROXIMITY)?;
            write_proximity(buf, pos, pairs)
        }
    }
}

fn read_payload(buf: &DataBuf, pos: usize, filled: usize) -> Result<DataPayload, ProtocolError> {
    let (payload_type, pos) = buf.read_short(pos, filled)?;
    match payload_type {
        PAYLOAD_TRACK => {
            let (count, mut pos) = buf.read_int(pos, filled)?;
            let mut records = Vec::with_capacity(count.max(0) as usize);
            for _ in 0..count.max(0) {
                let (r, p) = read_track_record(buf, pos, filled)?;
                pos = p;
                records.push(r);
            }
            Ok(DataPayload::Track(records))
        }
        PAYLOAD_PROXIMITY => {
            let (pairs, _) = read_proximity(buf, pos, filled)?;
            Ok(DataPayload::Proximity(pairs))
        }
        other => Err(ProtocolError::UnknownPayloadType(other)),
    }
}

/// Server-side per-client bookkeeping, stored in [`crate::hmap::HMap`]
/// keyed by the client's string identifier.
#[derive(Debug, Clone)]
pub struct ClientEntry {
    pub id: u32,
    pub remote_addr: std::net::SocketAddr,
    pub flags: i32,
    pub last_send_time_epoch_millis: i64,
    pub interval_millis: i32,
}
