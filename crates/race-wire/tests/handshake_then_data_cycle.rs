use race_wire::{ClientEntry, ClientRequest, DataBuf, DataMessage, DataPayload, HMap, Message, ServerAccept, TrackRecord};

/// Simulates one client lifecycle through the wire protocol: a
/// CLIENT_REQUEST frame is decoded, the server registers a [`ClientEntry`]
/// in its [`HMap`], replies with SERVER_ACCEPT, and a subsequent DATA frame
/// carrying one track record round-trips through the same encode/decode
/// path the UDP socket layer uses.
#[test]
fn client_registers_then_exchanges_a_data_frame() {
    let mut buf = DataBuf::with_capacity(4096);
    let request = Message::ClientRequest(ClientRequest {
        flags: 0,
        schema: "SimpleTrackProtocol".into(),
        sim_time_epoch_millis: 1_700_000_000_000,
        interval_millis: 1000,
    });
    let len = request.encode(&mut buf).unwrap();
    let decoded = Message::decode(&buf, len).unwrap();
    let Message::ClientRequest(req) = decoded else { panic!("expected a client request") };

    let mut clients: HMap<ClientEntry> = HMap::new();
    let entry = ClientEntry {
        id: 1,
        remote_addr: "127.0.0.1:9000".parse().unwrap(),
        flags: req.flags,
        last_send_time_epoch_millis: req.sim_time_epoch_millis,
        interval_millis: req.interval_millis,
    };
    clients.insert("client-1", entry);
    assert_eq!(clients.len(), 1);

    let mut accept_buf = DataBuf::with_capacity(4096);
    let accept = Message::ServerAccept(ServerAccept {
        server_flags: 0,
        sim_time_epoch_millis: req.sim_time_epoch_millis,
        effective_interval_millis: req.interval_millis,
        assigned_client_id: clients.get("client-1").unwrap().id,
    });
    let len = accept.encode(&mut accept_buf).unwrap();
    assert!(matches!(Message::decode(&accept_buf, len).unwrap(), Message::ServerAccept(_)));

    let mut data_buf = DataBuf::with_capacity(4096);
    let data = Message::Data(DataMessage {
        sender_id: clients.get("client-1").unwrap().id,
        send_time_epoch_millis: req.sim_time_epoch_millis + req.interval_millis as i64,
        payload: DataPayload::Track(vec![TrackRecord {
            id: "AC42".into(),
            msg_ord: 1,
            flags: 0,
            time_epoch_millis: req.sim_time_epoch_millis,
            lat_deg: 40.0,
            lon_deg: -75.0,
            alt_m: 3000.0,
            heading_deg: 180.0,
            speed_mps: 150.0,
            vertical_rate_mps: -2.5,
        }]),
    });
    let len = data.encode(&mut data_buf).unwrap();
    let round_tripped = Message::decode(&data_buf, len).unwrap();
    assert_eq!(round_tripped, data);
}
