//! Binary wire codec, UDP client protocol, open-addressing string map, and
//! the dual priority-queue event scheduler backing the RACE platform's
//! network and timing layers.

mod databuf;
mod error;
mod hmap;
mod message;
mod scheduler;
mod server;

pub use databuf::DataBuf;
pub use error::ProtocolError;
pub use hmap::HMap;
pub use message::{
    ClientEntry, ClientRequest, DataMessage, DataPayload, Message, ProximityPair, ServerAccept,
    ServerReject, TrackRecord, MAGIC, MSG_CLIENT_REQUEST, MSG_DATA, MSG_SERVER_ACCEPT,
    MSG_SERVER_REJECT, MSG_STOP, PAYLOAD_PROXIMITY, PAYLOAD_TRACK,
};
pub use scheduler::{Action, EventScheduler};
pub use server::{DataSource, RaceServer, SchemaPolicy};
