//! Single-threaded UDP server loop implementing the client state machine
//! from spec.md 4.C: accept/reject on `CLIENT_REQUEST`, periodic dispatch
//! to live clients, and removal on `STOP`, send failure, or silence
//! exceeding a grace interval.
//!
//! The socket and the shared outbound `DataBuf` are both owned by the
//! server thread — no locking is needed here, unlike the engine or the
//! scheduler.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{info, warn};

use crate::databuf::DataBuf;
use crate::hmap::HMap;
use crate::message::{
    ClientEntry, ClientRequest, DataMessage, Message, ServerAccept, ServerReject,
};

const RECV_TIMEOUT: Duration = Duration::from_millis(200);

/// Decides whether an incoming `CLIENT_REQUEST`'s schema is acceptable,
/// and if so what interval to grant.
pub trait SchemaPolicy {
    fn accept(&self, request: &ClientRequest) -> Result<i32, i32>;
}

/// Composes one client's outbound `DATA` payload for this dispatch tick.
/// Returning `Ok(None)` skips sending to that client this tick.
pub trait DataSource {
    fn compose(&mut self, client: &ClientEntry, sim_time_epoch_millis: i64) -> Option<crate::message::DataPayload>;
}

pub struct RaceServer<P, D> {
    socket: UdpSocket,
    clients: HMap<ClientEntry>,
    out_buf: DataBuf,
    in_buf: DataBuf,
    next_client_id: u32,
    grace_millis: i64,
    policy: P,
    source: D,
}

impl<P: SchemaPolicy, D: DataSource> RaceServer<P, D> {
    pub fn bind(addr: SocketAddr, grace_millis: i64, policy: P, source: D) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        Ok(Self {
            socket,
            clients: HMap::new(),
            out_buf: DataBuf::with_capacity(64 * 1024),
            in_buf: DataBuf::with_capacity(64 * 1024),
            next_client_id: 1,
            grace_millis,
            policy,
            source,
        })
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Block for up to the socket's read timeout waiting for one inbound
    /// datagram, then process it. Returns `Ok(true)` if a datagram was
    /// handled, `Ok(false)` on a read timeout.
    pub fn poll_once(&mut self) -> io::Result<bool> {
        let mut scratch = vec![0u8; self.in_buf.capacity()];
        let (n, from) = match self.socket.recv_from(&mut scratch) {
            Ok(v) => v,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        self.in_buf.as_mut_slice()[..n].copy_from_slice(&scratch[..n]);
        self.handle_datagram(n, from);
        Ok(true)
    }

    fn handle_datagram(&mut self, len: usize, from: SocketAddr) {
        let decoded = Message::decode(&self.in_buf, len);
        match decoded {
            Ok(Message::ClientRequest(req)) => self.handle_request(req, from),
            Ok(Message::Stop) => self.handle_stop(from),
            Ok(Message::Data(_)) => {
                if let Some(entry) = self.clients.get_mut(&from.to_string()) {
                    entry.last_send_time_epoch_millis = now_millis();
                }
            }
            Ok(other) => warn!(?other, %from, "unexpected message type from client"),
            Err(e) => warn!(error = %e, %from, "failed to decode inbound datagram"),
        }
    }

    fn handle_request(&mut self, req: ClientRequest, from: SocketAddr) {
        match self.policy.accept(&req) {
            Ok(effective_interval) => {
                let id = self.next_client_id;
                self.next_client_id += 1;
                let entry = ClientEntry {
                    id,
                    remote_addr: from,
                    flags: req.flags,
                    last_send_time_epoch_millis: now_millis(),
                    interval_millis: effective_interval,
                };
                self.clients.insert(&from.to_string(), entry);
                let reply = Message::ServerAccept(ServerAccept {
                    server_flags: 0,
                    sim_time_epoch_millis: req.sim_time_epoch_millis,
                    effective_interval_millis: effective_interval,
                    assigned_client_id: id,
                });
                self.send_to(&reply, from);
                info!(%from, id, "client accepted");
            }
            Err(reason_code) => {
                self.send_to(&Message::ServerReject(ServerReject { reason_code }), from);
                info!(%from, reason_code, "client rejected");
            }
        }
    }

    fn handle_stop(&mut self, from: SocketAddr) {
        self.clients.remove(&from.to_string());
        info!(%from, "client sent STOP");
    }

    fn send_to(&mut self, msg: &Message, addr: SocketAddr) -> bool {
        match msg.encode(&mut self.out_buf) {
            Ok(len) => match self.socket.send_to(self.out_buf.as_slice(len), addr) {
                Ok(_) => true,
                Err(e) => {
                    warn!(error = %e, %addr, "send failed, dropping client");
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, %addr, "failed to encode outbound message");
                false
            }
        }
    }

    /// Run one periodic dispatch tick: for every live client whose
    /// interval has elapsed, compose and send a `DATA` message; remove
    /// clients whose send fails or whose silence exceeds the grace
    /// interval.
    pub fn dispatch_tick(&mut self, sim_time_epoch_millis: i64) {
        let now = now_millis();
        let due: Vec<String> = self
            .clients
            .iter()
            .filter(|(_, c)| now - c.last_send_time_epoch_millis >= c.interval_millis as i64)
            .map(|(k, _)| k.to_string())
            .collect();

        let mut to_remove = Vec::new();
        for key in due {
            let Some(entry) = self.clients.get(&key).cloned() else { continue };
            if now - entry.last_send_time_epoch_millis > self.grace_millis {
                to_remove.push(key);
                continue;
            }
            let Some(payload) = self.source.compose(&entry, sim_time_epoch_millis) else {
                continue;
            };
            let msg = Message::Data(DataMessage {
                sender_id: 0,
                send_time_epoch_millis: now,
                payload,
            });
            let addr = entry.remote_addr;
            if self.send_to(&msg, addr) {
                if let Some(e) = self.clients.get_mut(&key) {
                    e.last_send_time_epoch_millis = now;
                }
            } else {
                to_remove.push(key);
            }
        }
        for key in to_remove {
            self.clients.remove(&key);
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::DataPayload;

    struct AcceptAll;
    impl SchemaPolicy for AcceptAll {
        fn accept(&self, _req: &ClientRequest) -> Result<i32, i32> {
            Ok(1000)
        }
    }

    struct NoData;
    impl DataSource for NoData {
        fn compose(&mut self, _client: &ClientEntry, _sim_time: i64) -> Option<DataPayload> {
            None
        }
    }

    #[test]
    fn request_reject_and_stop_drive_client_count() {
        let mut server = RaceServer::bind("127.0.0.1:0".parse().unwrap(), 30_000, AcceptAll, NoData).unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let server_addr = server.socket.local_addr().unwrap();

        let mut out = DataBuf::with_capacity(256);
        let req = Message::ClientRequest(ClientRequest {
            flags: 0,
            schema: "AnySchema".into(),
            sim_time_epoch_millis: 0,
            interval_millis: 1000,
        });
        let len = req.encode(&mut out).unwrap();
        client.send_to(out.as_slice(len), server_addr).unwrap();

        assert!(server.poll_once().unwrap());
        assert_eq!(server.client_count(), 1);

        let mut recv_buf = [0u8; 256];
        let (n, _) = client.recv_from(&mut recv_buf).unwrap();
        let mut in_buf = DataBuf::with_capacity(256);
        in_buf.as_mut_slice()[..n].copy_from_slice(&recv_buf[..n]);
        match Message::decode(&in_buf, n).unwrap() {
            Message::ServerAccept(acc) => assert_eq!(acc.effective_interval_millis, 1000),
            other => panic!("expected ServerAccept, got {other:?}"),
        }

        let mut stop_buf = DataBuf::with_capacity(16);
        let stop_len = Message::Stop.encode(&mut stop_buf).unwrap();
        client.send_to(stop_buf.as_slice(stop_len), server_addr).unwrap();
        assert!(server.poll_once().unwrap());
        assert_eq!(server.client_count(), 0);
    }
}
