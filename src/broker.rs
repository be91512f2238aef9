//! In-process service registry for the "local" domain.
//!
//! Providers register a [`SharedObject`] under an [`Address`]; proxies
//! resolve the address, watch its availability, call methods on the
//! registered object and subscribe to the topics it publishes. Calls and
//! event deliveries run on the broker's tokio runtime, never on the
//! caller's thread.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::rpc::{Address, AvailabilityStatus, CallId, CallStatus, SubscriptionId};
use crate::worker::SharedObject;

pub const LOCAL_DOMAIN: &str = "local";

/// Callback invoked with every value published on a subscribed topic.
pub type Listener = Arc<dyn Fn(Value) + Send + Sync>;

type Subscriber = (SubscriptionId, mpsc::UnboundedSender<Value>);

struct ServiceEntry {
    object: Option<Arc<dyn SharedObject>>,
    availability: watch::Sender<AvailabilityStatus>,
    subscriptions: HashMap<String, Vec<Subscriber>>,
}

impl ServiceEntry {
    fn new() -> Self {
        let (availability, _) = watch::channel(AvailabilityStatus::NotAvailable);
        Self {
            object: None,
            availability,
            subscriptions: HashMap::new(),
        }
    }
}

type SharedServices = Arc<Mutex<HashMap<Address, ServiceEntry>>>;

#[derive(Clone)]
pub struct Broker {
    handle: Handle,
    services: SharedServices,
}

impl Broker {
    /// Broker bound to the tokio runtime the caller is running on.
    pub fn local() -> io::Result<Self> {
        let handle = Handle::try_current().map_err(io::Error::other)?;
        Ok(Self::with_handle(handle))
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle,
            services: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Only the in-process domain is served.
    pub fn check_domain(address: &Address) -> io::Result<()> {
        if address.domain == LOCAL_DOMAIN {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported domain '{}'", address.domain),
            ))
        }
    }

    /// Register `object` as the provider behind `address` and mark the
    /// address available.
    pub fn register_service(
        &self,
        address: &Address,
        object: Arc<dyn SharedObject>,
    ) -> io::Result<()> {
        Self::check_domain(address)?;

        let mut services = self.services.lock();
        let entry = services
            .entry(address.clone())
            .or_insert_with(ServiceEntry::new);
        if entry.object.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("service already registered at {address}"),
            ));
        }
        entry.object = Some(object);
        entry.availability.send_replace(AvailabilityStatus::Available);
        log::info!("Registered service at {address}");
        Ok(())
    }

    /// Remove the provider behind `address`. Subscriptions survive so
    /// they keep receiving events once a provider registers again.
    pub fn unregister_service(&self, address: &Address) -> bool {
        let mut services = self.services.lock();
        match services.get_mut(address) {
            Some(entry) if entry.object.is_some() => {
                entry.object = None;
                entry
                    .availability
                    .send_replace(AvailabilityStatus::NotAvailable);
                log::info!("Unregistered service at {address}");
                true
            }
            _ => false,
        }
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.services
            .lock()
            .get(address)
            .is_some_and(|entry| entry.object.is_some())
    }

    /// Availability of `address`, as a receiver that observes every
    /// later change.
    pub fn availability(&self, address: &Address) -> io::Result<watch::Receiver<AvailabilityStatus>> {
        Self::check_domain(address)?;
        let mut services = self.services.lock();
        let entry = services
            .entry(address.clone())
            .or_insert_with(ServiceEntry::new);
        Ok(entry.availability.subscribe())
    }

    /// Invoke `method` on the object registered at `address` and block the
    /// calling thread until it replies.
    ///
    /// Must not be called from inside an async task.
    pub fn call_blocking(
        &self,
        address: &Address,
        method: &str,
        args: Value,
    ) -> Result<Value, CallStatus> {
        let object = {
            let services = self.services.lock();
            services.get(address).and_then(|entry| entry.object.clone())
        };
        let Some(object) = object else {
            return Err(CallStatus::NotAvailable);
        };

        let call_id = CallId(Uuid::new_v4().as_u128());
        log::debug!("Forwarding call {call_id:?} {method}({args}) to {address}");

        let (resp_tx, resp_rx) = oneshot::channel();
        let method_name = method.to_string();
        self.handle.spawn(async move {
            let result = object.call(&method_name, &args).await;
            let _ = resp_tx.send(result);
        });

        match resp_rx.blocking_recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                log::error!("Call {call_id:?} {method} on {address} failed: {err}");
                Err(CallStatus::from(&err))
            }
            Err(_) => {
                log::error!("Call {call_id:?} {method} on {address} ended without reply");
                Err(CallStatus::ConnectionFailed)
            }
        }
    }

    /// Deliver every value published on `topic` at `address` to
    /// `listener`, in publish order, on a broker task.
    pub fn subscribe(
        &self,
        address: &Address,
        topic: &str,
        listener: Listener,
    ) -> io::Result<SubscriptionId> {
        Self::check_domain(address)?;

        let id = SubscriptionId(Uuid::new_v4().as_u128());
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        self.handle.spawn(async move {
            while let Some(value) = rx.recv().await {
                listener(value);
            }
        });

        self.services
            .lock()
            .entry(address.clone())
            .or_insert_with(ServiceEntry::new)
            .subscriptions
            .entry(topic.to_string())
            .or_default()
            .push((id, tx));

        log::debug!("Subscription {id:?} on {address}/{topic}");
        Ok(id)
    }

    /// Fan `value` out to the subscribers of `topic`. Returns how many
    /// subscribers it reached.
    pub fn publish(&self, address: &Address, topic: &str, value: Value) -> usize {
        let mut services = self.services.lock();
        let Some(subscribers) = services
            .get_mut(address)
            .and_then(|entry| entry.subscriptions.get_mut(topic))
        else {
            return 0;
        };

        subscribers.retain(|(_, tx)| tx.send(value.clone()).is_ok());
        subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::rpc::RpcError;

    struct Echo;

    #[async_trait]
    impl SharedObject for Echo {
        async fn call(&self, method: &str, args: &Value) -> Result<Value, RpcError> {
            match method {
                "echo" => Ok(args.clone()),
                _ => Err(RpcError::UnknownMethod(method.into())),
            }
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn call_reaches_registered_object() {
        let rt = runtime();
        let broker = Broker::with_handle(rt.handle().clone());
        let address = Address::new(LOCAL_DOMAIN, "echo_1");

        broker.register_service(&address, Arc::new(Echo)).unwrap();

        let reply = broker.call_blocking(&address, "echo", json!(["hi"]));
        assert_eq!(reply, Ok(json!(["hi"])));

        let reply = broker.call_blocking(&address, "missing", Value::Null);
        assert_eq!(reply, Err(CallStatus::RemoteError));
    }

    #[test]
    fn call_without_provider_is_not_available() {
        let rt = runtime();
        let broker = Broker::with_handle(rt.handle().clone());
        let address = Address::new(LOCAL_DOMAIN, "nobody");

        assert_eq!(
            broker.call_blocking(&address, "echo", Value::Null),
            Err(CallStatus::NotAvailable)
        );
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let rt = runtime();
        let broker = Broker::with_handle(rt.handle().clone());
        let address = Address::new("remote", "echo_1");

        let err = broker.register_service(&address, Arc::new(Echo)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(broker.availability(&address).is_err());
    }

    #[test]
    fn second_registration_fails() {
        let rt = runtime();
        let broker = Broker::with_handle(rt.handle().clone());
        let address = Address::new(LOCAL_DOMAIN, "echo_1");

        broker.register_service(&address, Arc::new(Echo)).unwrap();
        let err = broker.register_service(&address, Arc::new(Echo)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        assert!(broker.unregister_service(&address));
        assert!(!broker.is_registered(&address));
        assert!(!broker.unregister_service(&address));
    }

    #[test]
    fn availability_follows_registration() {
        let rt = runtime();
        let broker = Broker::with_handle(rt.handle().clone());
        let address = Address::new(LOCAL_DOMAIN, "echo_1");

        let rx = broker.availability(&address).unwrap();
        assert_eq!(*rx.borrow(), AvailabilityStatus::NotAvailable);

        broker.register_service(&address, Arc::new(Echo)).unwrap();
        assert_eq!(*rx.borrow(), AvailabilityStatus::Available);

        broker.unregister_service(&address);
        assert_eq!(*rx.borrow(), AvailabilityStatus::NotAvailable);
    }

    #[test]
    fn publish_delivers_in_order() {
        let rt = runtime();
        let broker = Broker::with_handle(rt.handle().clone());
        let address = Address::new(LOCAL_DOMAIN, "news");

        let (tx, rx) = std_mpsc::channel();
        let tx = Mutex::new(tx);
        broker
            .subscribe(
                &address,
                "headline",
                Arc::new(move |value: Value| {
                    let _ = tx.lock().send(value);
                }),
            )
            .unwrap();

        assert_eq!(broker.publish(&address, "headline", json!(1)), 1);
        assert_eq!(broker.publish(&address, "headline", json!(2)), 1);
        assert_eq!(broker.publish(&address, "other", json!(3)), 0);

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((first, second), (json!(1), json!(2)));
    }
}
