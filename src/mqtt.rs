use crate::config::{MqttConfig, MqttProtocol};
use anyhow::{Context, Result};
use rumqttc::tokio_rustls::rustls;
use rumqttc::{v5, AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS, Transport};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection options for the configured protocol version.
#[derive(Debug, Clone)]
pub enum BrokerOptions {
    V311(MqttOptions),
    V5(v5::MqttOptions),
}

impl BrokerOptions {
    pub fn protocol(&self) -> MqttProtocol {
        match self {
            Self::V311(_) => MqttProtocol::V311,
            Self::V5(_) => MqttProtocol::V5,
        }
    }

    pub fn broker_address(&self) -> (String, u16) {
        match self {
            Self::V311(options) => options.broker_address(),
            Self::V5(options) => options.broker_address(),
        }
    }

    pub fn client_id(&self) -> String {
        match self {
            Self::V311(options) => options.client_id(),
            Self::V5(options) => options.client_id(),
        }
    }

    pub fn keep_alive(&self) -> Duration {
        match self {
            Self::V311(options) => options.keep_alive(),
            Self::V5(options) => options.keep_alive(),
        }
    }

    /// Clean session (3.1.1) or clean start (5).
    pub fn clean_start(&self) -> bool {
        match self {
            Self::V311(options) => options.clean_session(),
            Self::V5(options) => options.clean_start(),
        }
    }

    pub fn credentials(&self) -> Option<(String, String)> {
        match self {
            Self::V311(options) => options.credentials(),
            Self::V5(options) => options.credentials(),
        }
    }

    pub fn transport(&self) -> Transport {
        match self {
            Self::V311(options) => options.transport(),
            Self::V5(options) => options.transport(),
        }
    }
}

/// One-shot publisher: connect, publish a single message, disconnect.
pub struct MqttPublisher {
    options: BrokerOptions,
    topic: String,
    retain: bool,
}

impl MqttPublisher {
    pub fn from_config(config: &MqttConfig) -> Result<Self> {
        Ok(Self {
            options: build_options(config)?,
            topic: config.topic.clone(),
            retain: config.retain,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn options(&self) -> &BrokerOptions {
        &self.options
    }

    /// Publish `payload` and wait until the broker connection is closed cleanly.
    pub async fn publish(&self, payload: impl Into<Vec<u8>>) -> Result<()> {
        let (host, port) = self.options.broker_address();
        let payload = payload.into();

        let drive = async {
            let result = match &self.options {
                BrokerOptions::V311(options) => self.publish_v311(options.clone(), payload).await,
                BrokerOptions::V5(options) => self.publish_v5(options.clone(), payload).await,
            };
            result.with_context(|| format!("MQTT connection to {}:{} failed", host, port))
        };

        timeout(PUBLISH_TIMEOUT, drive)
            .await
            .with_context(|| format!("Timed out publishing to {}:{}", host, port))??;

        info!("Published message to {}", self.topic);
        Ok(())
    }

    async fn publish_v311(&self, options: MqttOptions, payload: Vec<u8>) -> Result<()> {
        let (client, mut eventloop) = AsyncClient::new(options, 10);

        client
            .publish(&self.topic, QoS::AtMostOnce, self.retain, payload)
            .await
            .context("Failed to queue MQTT message")?;
        client
            .disconnect()
            .await
            .context("Failed to queue MQTT disconnect")?;

        loop {
            match eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    debug!("Connected to MQTT broker: {:?}", ack.code);
                }
                Event::Outgoing(Outgoing::Publish(_)) => {
                    debug!("Message sent to topic {}", self.topic);
                }
                Event::Outgoing(Outgoing::Disconnect) => return Ok(()),
                _ => {}
            }
        }
    }

    async fn publish_v5(&self, options: v5::MqttOptions, payload: Vec<u8>) -> Result<()> {
        use v5::mqttbytes::v5::Packet;
        use v5::mqttbytes::QoS;

        let (client, mut eventloop) = v5::AsyncClient::new(options, 10);

        client
            .publish(&self.topic, QoS::AtMostOnce, self.retain, payload)
            .await
            .context("Failed to queue MQTT message")?;
        client
            .disconnect()
            .await
            .context("Failed to queue MQTT disconnect")?;

        loop {
            match eventloop.poll().await? {
                v5::Event::Incoming(Packet::ConnAck(ack)) => {
                    debug!("Connected to MQTT broker (v5): {:?}", ack.code);
                }
                v5::Event::Outgoing(Outgoing::Publish(_)) => {
                    debug!("Message sent to topic {}", self.topic);
                }
                v5::Event::Outgoing(Outgoing::Disconnect) => return Ok(()),
                _ => {}
            }
        }
    }
}

fn build_options(config: &MqttConfig) -> Result<BrokerOptions> {
    let client_id = config
        .client_id
        .clone()
        .unwrap_or_else(|| format!("weather2mqtt-{}", std::process::id()));
    let transport = build_transport(config)?;
    let credentials = config.credentials();

    let options = match config.protocol {
        MqttProtocol::V311 => {
            let mut options = MqttOptions::new(client_id, config.server.clone(), config.port);
            options.set_keep_alive(KEEP_ALIVE);
            options.set_clean_session(true);
            if let Some((username, password)) = credentials {
                options.set_credentials(username, password);
            }
            if let Some(transport) = transport {
                options.set_transport(transport);
            }
            BrokerOptions::V311(options)
        }
        MqttProtocol::V5 => {
            let mut options = v5::MqttOptions::new(client_id, config.server.clone(), config.port);
            options.set_keep_alive(KEEP_ALIVE);
            options.set_clean_start(true);
            if let Some((username, password)) = credentials {
                options.set_credentials(username, password);
            }
            if let Some(transport) = transport {
                options.set_transport(transport);
            }
            BrokerOptions::V5(options)
        }
    };

    Ok(options)
}

/// TLS transport when enabled. Insecure mode ignores the CA bundle.
fn build_transport(config: &MqttConfig) -> Result<Option<Transport>> {
    if !config.tls {
        return Ok(None);
    }

    if config.tls_insecure {
        warn!(
            "MQTT_TLS_INSECURE is set, the certificate of {} is not verified",
            config.server
        );
        return Ok(Some(Transport::tls_with_config(insecure_tls_config().into())));
    }

    let transport = match &config.ca_bundle {
        Some(path) => {
            let ca = std::fs::read(path)
                .with_context(|| format!("Failed to read CA bundle {}", path.display()))?;
            Transport::tls(ca, None, None)
        }
        None => Transport::tls_with_default_config(),
    };
    Ok(Some(transport))
}

fn insecure_tls_config() -> ClientConfig {
    let algorithms = rustls::crypto::ring::default_provider().signature_verification_algorithms;
    ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(algorithms)))
        .with_no_client_auth()
}

/// Accepts any certificate chain and host name. Handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyServerCert(WebPkiSupportedAlgorithms);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::TlsConfiguration;
    use tempfile::TempDir;

    fn config() -> MqttConfig {
        MqttConfig {
            server: "broker.local".to_string(),
            port: 1883,
            topic: "weather/current".to_string(),
            client_id: None,
            protocol: MqttProtocol::V311,
            retain: false,
            tls: false,
            tls_insecure: false,
            ca_bundle: None,
            username: None,
            password: None,
        }
    }

    // ==================== Options Tests ====================

    #[test]
    fn test_options_defaults() {
        let publisher = MqttPublisher::from_config(&config()).unwrap();
        let options = publisher.options();

        assert_eq!(options.protocol(), MqttProtocol::V311);
        assert_eq!(
            options.broker_address(),
            ("broker.local".to_string(), 1883)
        );
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert!(options.clean_start());
        assert!(options.client_id().starts_with("weather2mqtt-"));
        assert!(options.credentials().is_none());
        assert!(matches!(options.transport(), Transport::Tcp));
        assert_eq!(publisher.topic(), "weather/current");
    }

    #[test]
    fn test_options_client_id_and_port() {
        let mut config = config();
        config.client_id = Some("station-1".to_string());
        config.port = 8883;

        let publisher = MqttPublisher::from_config(&config).unwrap();
        assert_eq!(publisher.options().client_id(), "station-1");
        assert_eq!(publisher.options().broker_address().1, 8883);
    }

    #[test]
    fn test_options_v5() {
        let mut config = config();
        config.protocol = MqttProtocol::V5;
        config.client_id = Some("station-5".to_string());
        config.username = Some("user".to_string());
        config.password = Some("secret".to_string());

        let publisher = MqttPublisher::from_config(&config).unwrap();
        let options = publisher.options();

        assert!(matches!(options, BrokerOptions::V5(_)));
        assert_eq!(options.protocol(), MqttProtocol::V5);
        assert_eq!(options.client_id(), "station-5");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert!(options.clean_start());
        assert_eq!(
            options.credentials(),
            Some(("user".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_options_credentials_need_both_parts() {
        let mut config = config();
        config.username = Some("user".to_string());

        let publisher = MqttPublisher::from_config(&config).unwrap();
        assert!(publisher.options().credentials().is_none());
    }

    // ==================== TLS Tests ====================

    #[test]
    fn test_options_tls_with_missing_ca_bundle_is_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config();
        config.tls = true;
        config.ca_bundle = Some(dir.path().join("missing.pem"));

        assert!(MqttPublisher::from_config(&config).is_err());
    }

    #[test]
    fn test_options_tls_with_ca_bundle() {
        let dir = TempDir::new().unwrap();
        let ca = dir.path().join("ca.pem");
        std::fs::write(&ca, "-----BEGIN CERTIFICATE-----\n").unwrap();

        let mut config = config();
        config.tls = true;
        config.ca_bundle = Some(ca);

        let publisher = MqttPublisher::from_config(&config).unwrap();
        match publisher.options().transport() {
            Transport::Tls(TlsConfiguration::Simple { ca, .. }) => {
                assert_eq!(ca, b"-----BEGIN CERTIFICATE-----\n".to_vec());
            }
            _ => panic!("expected TLS with the configured CA bundle"),
        }
    }

    #[test]
    fn test_options_tls_insecure_skips_verification() {
        let dir = TempDir::new().unwrap();
        let mut config = config();
        config.tls = true;
        config.tls_insecure = true;
        config.ca_bundle = Some(dir.path().join("missing.pem"));

        let publisher = MqttPublisher::from_config(&config).unwrap();
        assert!(matches!(
            publisher.options().transport(),
            Transport::Tls(TlsConfiguration::Rustls(_))
        ));
    }

    #[test]
    fn test_options_tls_insecure_without_tls_is_plain_tcp() {
        let mut config = config();
        config.tls_insecure = true;

        let publisher = MqttPublisher::from_config(&config).unwrap();
        assert!(matches!(publisher.options().transport(), Transport::Tcp));
    }

    #[test]
    fn test_options_v5_with_insecure_tls() {
        let mut config = config();
        config.protocol = MqttProtocol::V5;
        config.tls = true;
        config.tls_insecure = true;

        let publisher = MqttPublisher::from_config(&config).unwrap();
        assert_eq!(publisher.options().protocol(), MqttProtocol::V5);
        assert!(matches!(
            publisher.options().transport(),
            Transport::Tls(TlsConfiguration::Rustls(_))
        ));
    }

    #[test]
    fn test_insecure_verifier_accepts_any_certificate() {
        let algorithms = rustls::crypto::ring::default_provider().signature_verification_algorithms;
        let verifier = AcceptAnyServerCert(algorithms);
        let cert = CertificateDer::from(vec![0u8; 4]);
        let name = ServerName::try_from("other.host").unwrap();

        assert!(verifier
            .verify_server_cert(&cert, &[], &name, &[], UnixTime::now())
            .is_ok());
        assert!(!verifier.supported_verify_schemes().is_empty());
    }

    // ==================== Publish Tests ====================

    fn unused_port() -> u16 {
        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_publish_to_unreachable_broker_fails() {
        let mut config = config();
        config.server = "127.0.0.1".to_string();
        config.port = unused_port();

        let publisher = MqttPublisher::from_config(&config).unwrap();
        assert!(publisher.publish("{}").await.is_err());
    }

    #[tokio::test]
    async fn test_publish_v5_to_unreachable_broker_fails() {
        let mut config = config();
        config.server = "127.0.0.1".to_string();
        config.port = unused_port();
        config.protocol = MqttProtocol::V5;

        let publisher = MqttPublisher::from_config(&config).unwrap();
        assert!(publisher.publish("{}").await.is_err());
    }
}
