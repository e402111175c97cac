use clap::{Parser, Subcommand};
use dnsbox::protocol::ResourceType;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "dnsbox")]
#[command(about = "DNS lookup client, forwarding server and HTTP API", long_about = None)]
pub struct Args {
    /// Log per-packet details and hex dumps of every datagram
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up records and print the answer section
    Resolve {
        /// Domain name to look up
        name: String,

        /// Record type: A, NS, CNAME, SOA, TXT or AAAA
        #[arg(default_value = "A", value_parser = parse_resource_type)]
        rtype: ResourceType,

        /// Server, where <address> will be of the form <ip>:<port>
        #[arg(short, long, default_value = "8.8.8.8:53", value_parser = parse_socket_addr)]
        server: SocketAddr,

        /// Seconds to wait for the reply
        #[arg(short, long, default_value_t = 5)]
        timeout: u64,
    },

    /// Run the forwarding server
    Serve {
        /// Listen address, of the form <ip>:<port>
        #[arg(short, long, default_value = "0.0.0.0:53", value_parser = parse_socket_addr)]
        listen: SocketAddr,

        /// Resolver, where <address> will be of the form <ip>:<port>
        #[arg(short, long, value_parser = parse_socket_addr)]
        resolver: Option<SocketAddr>,
    },

    /// Run the HTTP lookup API
    Api {
        /// Listen address, of the form <ip>:<port>
        #[arg(short, long, default_value = "0.0.0.0:8080", value_parser = parse_socket_addr)]
        listen: SocketAddr,

        /// Resolver, where <address> will be of the form <ip>:<port>
        #[arg(short, long, value_parser = parse_socket_addr)]
        resolver: Option<SocketAddr>,
    },
}

fn parse_socket_addr(s: &str) -> Result<SocketAddr, String> {
    s.parse::<SocketAddr>().map_err(|_| {
        format!(
            "Invalid address format: '{}'. Expected format: <ip>:<port>",
            s
        )
    })
}

fn parse_resource_type(s: &str) -> Result<ResourceType, String> {
    s.parse::<ResourceType>()
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let args = Args::try_parse_from(["dnsbox", "resolve", "google.com"]).unwrap();

        assert!(!args.verbose);
        match args.command {
            Command::Resolve {
                name,
                rtype,
                server,
                timeout,
            } => {
                assert_eq!(name, "google.com");
                assert_eq!(rtype, ResourceType::A);
                assert_eq!(server, "8.8.8.8:53".parse::<SocketAddr>().unwrap());
                assert_eq!(timeout, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_type_is_case_insensitive() {
        let args =
            Args::try_parse_from(["dnsbox", "resolve", "example.com", "txt", "-v"]).unwrap();

        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::Resolve { rtype: ResourceType::TXT, .. }
        ));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(Args::try_parse_from(["dnsbox", "resolve", "example.com", "MX"]).is_err());
    }

    #[test]
    fn test_serve_addresses() {
        let args = Args::try_parse_from([
            "dnsbox",
            "serve",
            "--listen",
            "127.0.0.1:2053",
            "--resolver",
            "1.1.1.1:53",
        ])
        .unwrap();

        match args.command {
            Command::Serve { listen, resolver } => {
                assert_eq!(listen, "127.0.0.1:2053".parse::<SocketAddr>().unwrap());
                assert_eq!(resolver, Some("1.1.1.1:53".parse().unwrap()));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_address() {
        let err = Args::try_parse_from(["dnsbox", "api", "--listen", "localhost"]).unwrap_err();
        assert!(err
            .to_string()
            .contains("Invalid address format: 'localhost'. Expected format: <ip>:<port>"));
    }
}
