//! Load-generating client (A7): dials the gateway, performs the IMEI
//! handshake, then streams randomized point batches on a fixed interval.
//! Grounded on `simulator/connection.go` and `simulator/send_random_points.go`.

use avl_gateway::frame::encode_frame;
use avl_gateway::imei::encode_imei;
use avl_gateway::record::{AvlRecord, Gps, IoElement, Priority};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

fn random_in(lo: f64, hi: f64) -> f64 {
    let seed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos() as f64;
    lo + (seed % 1_000_000.0) / 1_000_000.0 * (hi - lo)
}

fn random_priority() -> Priority {
    match (random_in(0.0, 3.0)) as u64 {
        0 => Priority::Low,
        1 => Priority::High,
        _ => Priority::Panic,
    }
}

fn generate_point() -> AvlRecord {
    let timestamp_ms = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as u64;
    AvlRecord {
        imei: String::new(), // filled in by the frame decoder on the server side
        timestamp_ms,
        priority: random_priority(),
        gps: Gps {
            longitude: random_in(-180.0, 180.0),
            latitude: random_in(-90.0, 90.0),
            altitude_m: random_in(-1000.0, 1000.0) as i16,
            angle_deg: random_in(0.0, 360.0) as u16,
            satellites: random_in(0.0, 12.0) as u8,
            speed_kmh: random_in(0.0, 200.0) as u16,
        },
        event_id: random_in(0.0, 100.0) as u16,
        io_elements: vec![IoElement::plain(1, "ignition", 1.0, 1)],
    }
}

async fn authenticate(conn: &mut TcpStream, imei: &str) -> std::io::Result<()> {
    conn.write_all(&encode_imei(imei)).await?;
    let mut buf = [0u8; 1];
    conn.read_exact(&mut buf).await?;
    if buf[0] != 1 {
        return Err(std::io::Error::other("authentication not accepted"));
    }
    Ok(())
}

async fn send_points(conn: &mut TcpStream, points: &[AvlRecord]) -> std::io::Result<()> {
    conn.write_all(&encode_frame(points)).await?;
    let mut buf = [0u8; 4];
    conn.read_exact(&mut buf).await?;
    if buf[3] as usize != points.len() {
        return Err(std::io::Error::other("sent points were not acknowledged"));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let server_addr = args.next().unwrap_or_else(|| "127.0.0.1:5000".to_owned());
    let imei = args.next().unwrap_or_else(|| "356307042441013".to_owned());

    let mut conn = TcpStream::connect(&server_addr).await?;
    authenticate(&mut conn, &imei).await?;
    println!("authenticated as {imei}, streaming points to {server_addr}");

    loop {
        let count = 1 + (random_in(0.0, 3.0) as usize);
        let points: Vec<AvlRecord> = (0..count).map(|_| generate_point()).collect();
        if let Err(e) = send_points(&mut conn, &points).await {
            eprintln!("failed to send points: {e}");
            return Ok(());
        }
        sleep(Duration::from_secs(3)).await;
    }
}
