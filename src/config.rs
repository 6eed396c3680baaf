//! CLI flags with environment-variable fallback, in the teacher's
//! hand-rolled style (no external CLI crate in the root package this was
//! grounded on). Mirrors the `HOST`/`PORT`/`NATS`/`AVLDB_CLICKHOUSE`
//! surface from spec.md §6.2.

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub avldb_dsn: Option<String>,
    /// spec.md §9 Open Question 2: lenient-by-default CRC handling, with a
    /// flag to make a mismatch fatal instead of just logged.
    pub strict_crc: bool,
    /// spec.md §9 Open Question 1: wire order is canonical; this flag opts
    /// into publishing the highest-timestamp record instead of the last
    /// one in wire order.
    pub sorted_last_point: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_owned(),
            port: 5000,
            nats_url: None,
            avldb_dsn: None,
            strict_crc: false,
            sorted_last_point: false,
        }
    }
}

impl Config {
    /// Parses `serve --host H --port P --nats URL --avldb DSN [--strict-crc] [--sorted]`,
    /// falling back to `HOST`/`PORT`/`NATS`/`AVLDB_CLICKHOUSE` env vars for
    /// anything not given on the command line.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Config, String> {
        let mut cfg = Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            nats_url: std::env::var("NATS").ok(),
            avldb_dsn: std::env::var("AVLDB_CLICKHOUSE").ok(),
            strict_crc: false,
            sorted_last_point: false,
        };

        let mut iter = args.into_iter().peekable();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "serve" => {}
                "--host" => cfg.host = iter.next().ok_or("--host requires a value")?,
                "--port" => {
                    let v = iter.next().ok_or("--port requires a value")?;
                    cfg.port = v.parse().map_err(|_| format!("invalid --port value: {v}"))?;
                }
                "--nats" => cfg.nats_url = Some(iter.next().ok_or("--nats requires a value")?),
                "--avldb" => cfg.avldb_dsn = Some(iter.next().ok_or("--avldb requires a value")?),
                "--strict-crc" => cfg.strict_crc = true,
                "--sorted" => cfg.sorted_last_point = true,
                other => return Err(format!("unrecognized argument: {other}")),
            }
        }
        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = ["serve", "--host", "127.0.0.1", "--port", "6000", "--strict-crc"]
            .into_iter()
            .map(String::from);
        let cfg = Config::from_args(args).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 6000);
        assert!(cfg.strict_crc);
    }

    #[test]
    fn rejects_unknown_flag() {
        let args = ["--bogus"].into_iter().map(String::from);
        assert!(Config::from_args(args).is_err());
    }
}
