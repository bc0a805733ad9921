//! Credentials used to authenticate while opening a connection.
//!
//! The credentials are part of [`OpenConnectionArguments`].
//!
//! [`OpenConnectionArguments`]: crate::OpenConnectionArguments
use amqp_wire::{
    to_buffer,
    types::{FieldValue, ShortStr},
};
use bytes::BytesMut;

use super::error::Result;

/// Credentials used to open a connection.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityCredentials {
    username: String,
    password: String,
    mechanism: AuthenticationMechanism,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthenticationMechanism {
    PLAIN,
    AMQPLAIN,
    EXTERNAL,
}

impl SecurityCredentials {
    /// Create and return a SASL/PLAIN credential with given `username` and `password`.
    ///
    /// See [RabbitMQ access control](https://www.rabbitmq.com/access-control.html#mechanisms).
    pub fn new_plain(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
            mechanism: AuthenticationMechanism::PLAIN,
        }
    }

    /// Create and return a AMQPLAIN credential with given `username` and `password`.
    ///
    /// See [RabbitMQ access control](https://www.rabbitmq.com/access-control.html#mechanisms).
    pub fn new_amqplain(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
            mechanism: AuthenticationMechanism::AMQPLAIN,
        }
    }

    /// Create and return EXTERNAL without credentials.
    ///
    /// The broker authenticates the client by other means, e.g. a client certificate.
    pub fn new_external() -> Self {
        Self {
            username: "".to_owned(),
            password: "".to_owned(),
            mechanism: AuthenticationMechanism::EXTERNAL,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the name of authentication mechanism of current credential
    pub(crate) fn get_mechanism_name(&self) -> &'static str {
        match self.mechanism {
            AuthenticationMechanism::PLAIN => "PLAIN",
            AuthenticationMechanism::AMQPLAIN => "AMQPLAIN",
            AuthenticationMechanism::EXTERNAL => "EXTERNAL",
        }
    }

    /// Get the security challenge `response` bytes, to be sent to server.
    pub(crate) fn get_response(&self) -> Result<Vec<u8>> {
        match self.mechanism {
            AuthenticationMechanism::PLAIN => {
                Ok(format!("\0{}\0{}", self.username, self.password).into_bytes())
            }
            AuthenticationMechanism::AMQPLAIN => {
                let mut buf = BytesMut::new();
                for (key, value) in [("LOGIN", &self.username), ("PASSWORD", &self.password)] {
                    let key: ShortStr = key.try_into()?;
                    let value = FieldValue::S(value.as_str().try_into()?);
                    to_buffer(&key, &mut buf)?;
                    to_buffer(&value, &mut buf)?;
                }
                Ok(buf.to_vec())
            }
            AuthenticationMechanism::EXTERNAL => Ok(Vec::new()),
        }
    }
}

// never print the password
impl std::fmt::Debug for SecurityCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityCredentials")
            .field("username", &self.username)
            .field("mechanism", &self.mechanism)
            .finish()
    }
}
