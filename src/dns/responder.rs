use crate::config::Config;
use crate::dns::codec;
use crate::error::Error;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// Datagrams longer than this are truncated by the receive.
pub const MAX_DATAGRAM_LEN: usize = 256;

/// Answers every DNS query arriving on its socket with one fixed IPv4 address.
#[derive(Debug)]
pub struct DnsCatchallResponder {
    address: Ipv4Addr,
    socket: UdpSocket,
    backoff: Duration,
    yield_interval: Duration,
}

impl DnsCatchallResponder {
    /// Bind a non-blocking, address-reusing UDP socket on `0.0.0.0:<dns_port>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BindFailure`] if the socket can't be created or bound.
    pub fn bind(config: &Config, address: Ipv4Addr) -> Result<Self, Error> {
        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.dns_port));
        let socket = Self::reusable_socket(bind_addr).map_err(|source| Error::BindFailure {
            addr: bind_addr,
            source,
        })?;
        Ok(DnsCatchallResponder {
            address,
            socket,
            backoff: config.dns_backoff,
            yield_interval: config.dns_yield,
        })
    }

    fn reusable_socket(bind_addr: SocketAddr) -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&bind_addr.into())?;
        UdpSocket::from_std(socket.into())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }

    /// Poll the socket until `token` is cancelled or a socket error other than would-block
    /// occurs. The socket is closed when this future completes or is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] for the socket error that stopped the loop.
    pub async fn run(self, token: CancellationToken) -> Result<(), Error> {
        tracing::info!(
            "DNS catch-all listening on UDP {}, answering with {}",
            self.local_addr()?,
            self.address
        );
        let mut buf = [0u8; MAX_DATAGRAM_LEN];
        while !token.is_cancelled() {
            match self.socket.try_recv_from(&mut buf) {
                Ok((len, peer)) => self.answer(&buf[..len], peer).await?,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if Self::pause(&token, self.backoff).await {
                        break;
                    }
                }
                Err(err) => return Err(err.into()),
            }
            if Self::pause(&token, self.yield_interval).await {
                break;
            }
        }
        tracing::info!("DNS catch-all on {} stopped", self.local_addr()?);
        Ok(())
    }

    async fn answer(&self, frame: &[u8], peer: SocketAddr) -> Result<(), Error> {
        let query = match codec::decode_query_header(frame) {
            Ok(query) => query,
            Err(err) => {
                tracing::debug!("dropping frame from {peer}: {}", Error::from(err));
                return Ok(());
            }
        };
        let response = codec::encode_response(&query, self.address);
        self.socket.send_to(&response, peer).await?;
        tracing::debug!(
            "answered {} question(s) from {peer} with {}",
            query.question_count,
            self.address
        );
        Ok(())
    }

    /// Sleep for `duration`, returning `true` early if `token` is cancelled meanwhile.
    async fn pause(token: &CancellationToken, duration: Duration) -> bool {
        tokio::select! {
            () = token.cancelled() => true,
            () = tokio::time::sleep(duration) => false,
        }
    }
}
