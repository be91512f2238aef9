use std::io::{self, Cursor};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::{sync::watch, task, task::JoinHandle, time::sleep};

use crate::{
    broker::Broker,
    client::VehicleMediaControlProxy,
    config,
    command::TestCase,
    consumer::VmcConsumer,
    provider::{CREATED_VIEW_ID, VmcProvider, run_stub},
    rpc::{Address, CallStatus, RpcError, method, topic},
    shell::{self, Input, LoopState, Session},
    types::*,
    worker::SharedObject,
};

struct Provider {
    broker: Broker,
    provider: Arc<VmcProvider>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<io::Result<()>>,
}

impl Provider {
    async fn start(instance: &str) -> Self {
        let broker = Broker::local().unwrap();
        let provider = Arc::new(VmcProvider::new(broker.clone(), instance));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_stub(provider.clone(), shutdown_rx));

        for _ in 0..100 {
            if broker.is_registered(provider.address()) {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert!(broker.is_registered(provider.address()));

        Self {
            broker,
            provider,
            shutdown,
            task,
        }
    }

    async fn stop(self) {
        let _ = self.shutdown.send(true);
        tokio::time::timeout(Duration::from_secs(2), self.task)
            .await
            .expect("provider did not stop")
            .unwrap()
            .unwrap();
        assert!(!self.broker.is_registered(self.provider.address()));
    }
}

fn input(text: &str) -> Input {
    Input::new(Cursor::new(text.as_bytes().to_vec()))
}

const CASE: TestCase<'static> = TestCase {
    id: 9,
    name: "generalSetParameters",
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn option_zero_without_provider_keeps_looping() {
    let broker = Broker::local().unwrap();

    let (state, available) = task::spawn_blocking(move || {
        let mut session = Session::new(&broker, None, input(""), config::HU_INSTANCE);
        let registry = shell::commands();
        let tokens = ["-o".to_string(), "0".to_string()];
        let state = shell::handle_line(&mut session, &registry, &tokens);
        (state, session.consumer.is_available())
    })
    .await
    .unwrap();

    assert_eq!(state, LoopState::Continue);
    assert!(!available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exit_option_ends_loop_and_releases_provider() {
    let provider = Provider::start(config::HU_INSTANCE).await;
    let broker = provider.broker.clone();
    let stub = provider.provider.clone();

    let mut session = task::spawn_blocking(move || {
        let mut session = Session::new(
            &broker,
            Some(stub),
            input("-o 77\n\n-o 999\n-o 0\n"),
            config::HU_INSTANCE,
        );
        shell::primary_loop(&mut session, &shell::commands());
        session
    })
    .await
    .unwrap();

    // the line after 999 is never read
    assert_eq!(
        session.input.next_line(),
        Some(vec!["-o".to_string(), "0".to_string()])
    );

    provider.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exit_flag_ends_loop() {
    let broker = Broker::local().unwrap();

    let mut session = task::spawn_blocking(move || {
        let mut session = Session::new(&broker, None, input("-l\n-e\n-m\n"), config::RSE_INSTANCE);
        shell::primary_loop(&mut session, &shell::commands());
        session
    })
    .await
    .unwrap();

    assert_eq!(session.input.next_line(), Some(vec!["-m".to_string()]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn set_parameters_echoes_sample_list() {
    let provider = Provider::start(config::HU_INSTANCE).await;
    let broker = provider.broker.clone();

    let outcome = task::spawn_blocking(move || {
        VmcConsumer::new(&broker).general_set_parameters(0, &CASE)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome.status, CallStatus::Success);
    let (pairs, result) = outcome.result.unwrap();
    assert_eq!(result, VmcSetParametersResult::NoError);
    assert_eq!(pairs.len(), 10);
    assert_eq!(pairs[0], VmcKeyValuePair::new("Format", "MPEG Audio"));
    assert_eq!(pairs[9], VmcKeyValuePair::new("Recorded date", "2008-10-28"));

    provider.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn create_view_answers_129() {
    let provider = Provider::start(config::HU_INSTANCE).await;
    let broker = provider.broker.clone();

    let outcome = task::spawn_blocking(move || {
        let consumer = VmcConsumer::new(&broker);
        consumer.browser_create_view(
            "15",
            u16::MAX,
            &VmcSelectedMediaItem::MediaId("15".into()),
            &CASE,
        )
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        outcome.result,
        Some((CREATED_VIEW_ID, VmcCreateViewResult::NoError))
    );

    provider.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn icon_bytes_are_appended_to_dump() {
    let provider = Provider::start(config::HU_INSTANCE).await;
    let broker = provider.broker.clone();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iconRaw.bin");
    let dump = path.clone();

    task::spawn_blocking(move || {
        let consumer = VmcConsumer::new(&broker).with_icon_dump_path(dump);
        for _ in 0..2 {
            let outcome = consumer.general_get_icon(&CASE).unwrap();
            assert_eq!(outcome.status, CallStatus::Success);
        }
    })
    .await
    .unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), vec![0x99; 4]);

    provider.stop().await;
}

/// Head unit that answers every icon request with no data.
struct BlankIcon;

#[async_trait]
impl SharedObject for BlankIcon {
    async fn call(&self, name: &str, _args: &Value) -> Result<Value, RpcError> {
        match name {
            method::GENERAL_GET_ICON => Ok(json!([VmcIcon::default(), "NO_ERROR"])),
            _ => Err(RpcError::UnknownMethod(name.into())),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_icon_is_not_dumped() {
    let broker = Broker::local().unwrap();
    let address = Address::new(config::DOMAIN, config::HU_INSTANCE);
    broker.register_service(&address, Arc::new(BlankIcon)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iconRaw.bin");
    let dump = path.clone();

    let outcome = task::spawn_blocking(move || {
        let consumer = VmcConsumer::new(&broker).with_icon_dump_path(dump);
        consumer.general_get_icon(&CASE).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(outcome.status, CallStatus::Success);
    let (icon, result) = outcome.result.unwrap();
    assert!(icon.icon_raw_data.is_empty());
    assert_eq!(result, VmcGetIconResult::NoError);
    assert!(!path.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn consumer_only_reaches_head_unit_instance() {
    let provider = Provider::start(config::RSE_INSTANCE).await;
    let broker = provider.broker.clone();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iconRaw.bin");
    let dump = path.clone();

    let status = task::spawn_blocking(move || {
        let consumer = VmcConsumer::new(&broker).with_icon_dump_path(dump);
        consumer.general_get_icon(&CASE).unwrap().status
    })
    .await
    .unwrap();

    assert_eq!(status, CallStatus::NotAvailable);
    assert!(!path.exists());

    provider.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn playback_state_command_notifies_subscribers() {
    let provider = Provider::start(config::HU_INSTANCE).await;
    let broker = provider.broker.clone();
    let stub = provider.provider.clone();

    let proxy =
        VehicleMediaControlProxy::build(&broker, config::DOMAIN, config::HU_INSTANCE).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    proxy
        .subscribe(topic::PLAYER_PLAYBACK_STATE, move |state: VmcPlaybackState| {
            let _ = tx.send(state);
        })
        .unwrap();

    task::spawn_blocking(move || {
        // 6 % 4 selects PAUSED
        let mut session = Session::new(&broker, Some(stub), input("-o 21 6\n"), config::HU_INSTANCE);
        shell::primary_loop(&mut session, &shell::commands());
    })
    .await
    .unwrap();

    let state = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap();
    assert_eq!(state, Some(VmcPlaybackState::Paused));
    assert_eq!(provider.provider.player_playback_state(), VmcPlaybackState::Paused);

    provider.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restricted_mode_out_of_range_stays_unrestricted() {
    let provider = Provider::start(config::HU_INSTANCE).await;
    let broker = provider.broker.clone();
    let stub = provider.provider.clone();

    task::spawn_blocking(move || {
        let mut session = Session::new(
            &broker,
            Some(stub),
            input("-o 29 1\n-o 29 5\n"),
            config::HU_INSTANCE,
        );
        let registry = shell::commands();
        let tokens = session.input.next_line().unwrap();
        shell::handle_line(&mut session, &registry, &tokens);
        assert_eq!(
            session.provider.as_ref().unwrap().media_restricted_mode(),
            VmcMediaRestrictedMode::Restricted
        );
        let tokens = session.input.next_line().unwrap();
        shell::handle_line(&mut session, &registry, &tokens);
    })
    .await
    .unwrap();

    assert_eq!(
        provider.provider.media_restricted_mode(),
        VmcMediaRestrictedMode::Unrestricted
    );

    provider.stop().await;
}
