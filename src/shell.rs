//! Interactive menu loop.
//!
//! Each input line is parsed as a small command line (`-o 3`, `-l`, ...).
//! Commands that need more input read further whitespace-separated tokens
//! from the same input, so `-o 8 1500` works as well as answering the
//! prompt on the next line.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::Arc;

use clap::{ArgAction, CommandFactory, Parser};

use crate::broker::Broker;
use crate::command::{CommandRegistry, TestCase};
use crate::config;
use crate::consumer::VmcConsumer;
use crate::provider::VmcProvider;
use crate::samples;
use crate::types::*;

const MENU: &str = r#"
----------------VmcTestClient as consumer -----------------------------------------------------
                        0.isAvailable                    13.playerPlayFromMediaId
                        1.sourceConnectTo                14.browserAcknowledgeKeepAlive
                        2.playerFastForward              15.browserCreateView
                        3.generalGetIcon                 16.browserDestroyView
                        4.generalGetParameters           17.browserMoveWindow
                        5.playerPause                    18.browserResizeWindow
                        6.playerPlay                     19.browserMoveViewToItem
                        7.playerRewind                   20.playerSkipToMediaId
                        8.playerSeekTo
                        9.generalSetParameters
                        10.playerSkipToPrevious
                        11.playerSkipToNext
                        12.playerStop

----------------VmcTestClient as provider -----------------------------------------------------
                        21.setPlayerPlaybackStateAttribute
                        22.setPlayerActiveMediaItemAttribute
                        23.setPlayerActiveMediaItemTimeAttribute
                        24.setSourceActiveSourcePropertiesAttribute
                        25.setSourceListAttribute
                        26.broadcastGeneralParametersUpdated
                        27.broadcastBrowserQueryKeepAliveEvent
                        28.broadcastBrowserWindowChangedEvent
                        29.setMediaRestrictedModeAttribute

                        999.exit

----------------End of Menu -------------------------------------------------------------------
"#;

/// Options accepted on one input line.
#[derive(Parser, Debug)]
#[command(
    name = "vmc",
    about = "Allowed options (ex : vmc -o 3)",
    disable_help_flag = true
)]
pub struct LineArgs {
    /// produce help message
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub help: bool,

    /// show the Classic style Menu
    #[arg(short, long)]
    pub menu: bool,

    /// exit the program
    #[arg(short, long)]
    pub exit: bool,

    /// list all available commands with descriptions.
    #[arg(short, long)]
    pub list: bool,

    /// option
    #[arg(short, long)]
    pub option: Option<u32>,

    /// User will set sourceId like parameters in separate options for convenience.
    #[arg(long = "sourceId")]
    pub source_id: Option<String>,

    /// Answers to the prompts of the selected command.
    #[arg(hide = true)]
    pub answers: Vec<String>,
}

/// Token reader over the interactive input.
pub struct Input {
    reader: Box<dyn BufRead + Send>,
    pending: VecDeque<String>,
}

impl Input {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            pending: VecDeque::new(),
        }
    }

    pub fn stdin() -> Self {
        Self::new(io::BufReader::new(io::stdin()))
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                log::error!("Failed to read input: {e}");
                None
            }
        }
    }

    /// Tokens left on the current line, or the tokens of the next line.
    /// `None` once the input is exhausted.
    pub fn next_line(&mut self) -> Option<Vec<String>> {
        if !self.pending.is_empty() {
            return Some(self.pending.drain(..).collect());
        }
        let line = self.read_line()?;
        Some(line.split_whitespace().map(str::to_string).collect())
    }

    /// Put `tokens` back in front of whatever is still pending.
    pub fn unread(&mut self, tokens: Vec<String>) {
        for token in tokens.into_iter().rev() {
            self.pending.push_front(token);
        }
    }

    /// Next whitespace-separated token, reading more lines as needed.
    pub fn next_token(&mut self) -> Option<String> {
        while self.pending.is_empty() {
            let line = self.read_line()?;
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        self.pending.pop_front()
    }
}

/// Everything a menu command can touch.
pub struct Session {
    pub consumer: VmcConsumer,
    pub provider: Option<Arc<VmcProvider>>,
    pub input: Input,
    pub instance: String,
    /// `--sourceId` of the line being dispatched.
    pub source_id: Option<String>,
}

impl Session {
    pub fn new(
        broker: &Broker,
        provider: Option<Arc<VmcProvider>>,
        input: Input,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            consumer: VmcConsumer::new(broker),
            provider,
            input,
            instance: instance.into(),
            source_id: None,
        }
    }

    pub fn read_token(&mut self) -> String {
        self.input.next_token().unwrap_or_default()
    }

    /// Read a number for `field`, falling back to `default` when the token
    /// does not parse.
    pub fn read_number<T>(&mut self, field: &str, default: T) -> T
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(token) = self.input.next_token() else {
            return default;
        };
        token.parse().unwrap_or_else(|_| {
            log::warn!("{field}: '{token}' is not valid, use the default {default} as input.");
            default
        })
    }

    /// Read a view id; anything outside `u8` becomes 1.
    pub fn read_view_id(&mut self, case: &TestCase) -> VmcViewId {
        let raw: u32 = self.read_number("viewId", 1);
        VmcViewId::try_from(raw).unwrap_or_else(|_| {
            log::warn!("{}: use the default viewId = 1 as input.", case.name);
            1
        })
    }

    fn with_provider(&self, what: &str, f: impl FnOnce(&VmcProvider)) {
        match &self.provider {
            Some(provider) => f(provider),
            None => log::info!("unable to {what}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Continue,
    /// The line named no known command; a diagnostic was printed.
    Unrecognized,
    Exit,
}

pub fn display_prompt(instance: &str) {
    println!("\n           @@@@@@@  Testing with provider instance ID : {instance}  @@@@@@@\n");
    println!("{MENU}");
}

fn print_list(registry: &CommandRegistry<Session>) {
    println!("Available commands(vmc -o ):");
    for command in registry.list() {
        println!(
            "ID: {}, Name: {} - {}",
            command.id, command.name, command.description
        );
    }
}

/// Handle one parsed input line.
pub fn handle_line(
    session: &mut Session,
    registry: &CommandRegistry<Session>,
    tokens: &[String],
) -> LoopState {
    let argv = std::iter::once("vmc").chain(tokens.iter().map(String::as_str));
    let args = match LineArgs::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) => {
            println!("{e}");
            return LoopState::Continue;
        }
    };

    if args.help {
        println!("{}", LineArgs::command().render_help());
        return LoopState::Continue;
    }

    if args.menu {
        display_prompt(&session.instance);
        return LoopState::Continue;
    }

    if args.exit {
        return LoopState::Exit;
    }

    if args.list {
        print_list(registry);
        return LoopState::Continue;
    }

    let Some(option) = args.option else {
        if args.answers.is_empty() && args.source_id.is_none() {
            return LoopState::Continue;
        }
        println!(
            "Unknown input: {}    find available commands by $ vmc -l or $ vmc -m",
            tokens.join(" ")
        );
        return LoopState::Unrecognized;
    };

    if option == config::EXIT_OPTION {
        return LoopState::Exit;
    }

    match registry.resolve(&option.to_string()) {
        Some(command) => {
            session.input.unread(args.answers);
            session.source_id = args.source_id;
            command.run(session);
            session.source_id = None;
            LoopState::Continue
        }
        None => {
            println!(
                "Unknown command: {option}    find available commands by $ vmc -l or $ vmc -m"
            );
            LoopState::Unrecognized
        }
    }
}

/// Read and dispatch lines until an exit request or the end of input.
pub fn primary_loop(session: &mut Session, registry: &CommandRegistry<Session>) {
    display_prompt(&session.instance);

    while let Some(tokens) = session.input.next_line() {
        if handle_line(session, registry, &tokens) == LoopState::Exit {
            println!("Exiting primaryLoop");
            return;
        }
    }
    log::info!("Input closed, leaving primaryLoop");
}

/// The menu of the test client.
pub fn commands() -> CommandRegistry<Session> {
    let mut registry = CommandRegistry::<Session>::new();
    registry
        .register(0, "isAvailable", "Check if provider is available", |s, _| {
            s.consumer.is_available();
        })
        .register(
            1,
            "sourceConnectTo",
            "Allows connecting to a specific media source.",
            |s, case| {
                let source_id = match s.source_id.take() {
                    Some(source_id) => source_id,
                    None => {
                        log::info!(
                            "sourceConnectTo: input the source id. Empty String is reserved as INVALID sourceId."
                        );
                        s.read_token()
                    }
                };
                s.consumer.source_connect_to(&source_id, &case);
            },
        )
        .register(
            2,
            "playerFastForward",
            "Forward action \"fastForward\" directly to source",
            |s, case| {
                s.consumer.player_fast_forward(&case);
            },
        )
        .register(
            3,
            "generalGetIcon",
            "Fetch image from media module cache",
            |s, case| {
                s.consumer.general_get_icon(&case);
            },
        )
        .register(
            4,
            "generalGetParameters",
            "Generic method for retrieving vendor-specific parameter values",
            |s, case| {
                s.consumer.general_get_parameters(&case);
            },
        )
        .register(
            5,
            "playerPause",
            "Forward action \"pause\" directly to source.",
            |s, case| {
                s.consumer.player_pause(&case);
            },
        )
        .register(
            6,
            "playerPlay",
            "Forward action \"play\" directly to source.",
            |s, case| {
                s.consumer.player_play(&case);
            },
        )
        .register(
            7,
            "playerRewind",
            "Forward action \"rewind\" directly to source.",
            |s, case| {
                s.consumer.player_rewind(&case);
            },
        )
        .register(
            8,
            "playerSeekTo",
            "Allows to modify the elapsedTime of the currently active media.",
            |s, case| {
                log::info!("playerSeekTo: ValidRange: [0, UInt32_MAX]. Unit: milliseconds [ms]");
                let elapsed = s.read_number("playerSeekTo", 0u32);
                s.consumer.player_seek_to(elapsed, &case);
            },
        )
        .register(
            9,
            "generalSetParameters",
            "Generic method for setting vendor-specific parameter values.",
            |s, case| {
                log::info!(
                    "generalSetParameters: ValidRange: [0, 1] (@0 for Lady Gaga, @others for 보아)"
                );
                let index = s.read_number("generalSetParameters", 0u32);
                s.consumer.general_set_parameters(index, &case);
            },
        )
        .register(
            10,
            "playerSkipToPrevious",
            "Forward action \"skipToPrevious\" directly to source.",
            |s, case| {
                s.consumer.player_skip_to_previous(&case);
            },
        )
        .register(
            11,
            "playerSkipToNext",
            "Forward action \"skipToNext\" directly to source.",
            |s, case| {
                s.consumer.player_skip_to_next(&case);
            },
        )
        .register(
            12,
            "playerStop",
            "Forward action \"stop\" directly to source.",
            |s, case| {
                s.consumer.player_stop(&case);
            },
        )
        .register(
            13,
            "playerPlayFromMediaId",
            "Request active source to play specific mediaId.",
            |s, case| {
                log::info!("playerPlayFromMediaId: input the mediaId by string:");
                let media_id = s.read_token();
                s.consumer.player_play_from_media_id(&media_id, &case);
            },
        )
        .register(
            14,
            "browserAcknowledgeKeepAlive",
            "Informs the server that the provided viewId has to be kept alive.",
            |s, case| {
                log::info!("browserAcknowledgeKeepAlive: input the viewId by uint8_t:");
                let view_id = s.read_view_id(&case);
                s.consumer.browser_acknowledge_keep_alive(view_id, &case);
            },
        )
        .register(
            15,
            "browserCreateView",
            "Creates an empty view with a (sliding) window on top of it.",
            |s, case| {
                log::info!("browserCreateView: select the windowSize by uint16_t:");
                let raw: u32 = s.read_number("windowSize", 1);
                let window_size = VmcWindowSize::try_from(raw).unwrap_or_else(|_| {
                    log::warn!("browserCreateView: use the default windowSize = 1 as input.");
                    1
                });
                let selected = VmcSelectedMediaItem::MediaId("15".into());
                s.consumer
                    .browser_create_view("15", window_size, &selected, &case);
            },
        )
        .register(16, "browserDestroyView", "Destroys an existing view.", |s, case| {
            log::info!("browserDestroyView: input the viewId by uint8_t:");
            let view_id = s.read_view_id(&case);
            s.consumer.browser_destroy_view(view_id, &case);
        })
        .register(
            17,
            "browserMoveWindow",
            "Move the (sliding) window to a specific media item.",
            |s, case| {
                log::info!("browserMoveWindow: input the viewId by uint8_t:");
                let view_id = s.read_view_id(&case);
                let selected = VmcSelectedMediaItem::MediaId("17".into());
                s.consumer.browser_move_window(view_id, &selected, &case);
            },
        )
        .register(
            18,
            "browserResizeWindow",
            "Resize the (sliding) window of the specified view.",
            |s, case| {
                const DEFAULT_WINDOW_SIZE: VmcWindowSize = 128;
                log::info!(
                    "browserResizeWindow: input the viewId by uint8_t, windowSize with default value 128"
                );
                let view_id = s.read_view_id(&case);
                s.consumer
                    .browser_resize_window(view_id, DEFAULT_WINDOW_SIZE, &case);
            },
        )
        .register(
            19,
            "browserMoveViewToItem",
            "Moves an existing view to a new parent in the same source as the existing view",
            |s, case| {
                log::info!("browserMoveViewToItem: input the viewId by uint8_t:");
                let view_id = s.read_view_id(&case);
                let selected = VmcSelectedMediaItem::Position(19);
                s.consumer
                    .browser_move_view_to_item(view_id, "19", &selected, &case);
            },
        )
        .register(
            20,
            "playerSkipToMediaId",
            "Skip to a specific media ID.",
            |s, case| {
                log::info!("playerSkipToMediaId: input the mediaId by string:");
                let media_id = s.read_token();
                s.consumer.player_skip_to_media_id(&media_id, &case);
            },
        )
        .register(
            21,
            "setPlayerPlaybackStateAttribute",
            "Set playback state attribute",
            |s, _| {
                log::info!("setPlayerPlaybackStateAttribute: ValidRange: [0, 3]");
                let raw = s.read_number("playbackState", 0i64);
                let state = VmcPlaybackState::from_index_wrapping(raw.rem_euclid(4) as u32);
                s.with_provider("setPlayerPlaybackStateAttribute", |p| {
                    p.set_player_playback_state_attribute(state)
                });
            },
        )
        .register(
            22,
            "setPlayerActiveMediaItemAttribute",
            "Set active media item attribute",
            |s, _| {
                log::info!(
                    "setPlayerActiveMediaItemAttribute: Collection of all metadata information used for describing a media item."
                );
                println!("Enter displayIconId: ");
                let display_icon = s.read_token();
                let item = samples::build_media_item_metadata(&display_icon);
                s.with_provider("setPlayerActiveMediaItemAttribute", |p| {
                    p.set_player_active_media_item_attribute(item)
                });
            },
        )
        .register(
            23,
            "setPlayerActiveMediaItemTimeAttribute",
            "Set active media item time attribute",
            |s, _| {
                log::info!(
                    "setPlayerActiveMediaItemTimeAttribute: input the elapsed time [MIN = 0, MAX = UInt32_MAX]. Unit: milliseconds [ms]."
                );
                let time = VmcMediaItemTime {
                    elapsed_time: s.read_number("elapsedTime", 0u32),
                    total_time: u32::MAX,
                };
                s.with_provider("setPlayerActiveMediaItemTimeAttribute", |p| {
                    p.set_player_active_media_item_time_attribute(time)
                });
            },
        )
        .register(
            24,
            "setSourceActiveSourcePropertiesAttribute",
            "Set source active source properties attribute",
            |s, _| {
                log::info!("setSourceActiveSourcePropertiesAttribute: only set browseRoot.");
                println!("Enter browseRoot: ");
                let browse_root = s.read_token();
                let properties = samples::build_media_source_properties(&browse_root);
                s.with_provider("setSourceActiveSourcePropertiesAttribute", |p| {
                    p.set_source_active_source_properties_attribute(properties)
                });
            },
        )
        .register(
            25,
            "setSourceListAttribute",
            "Set source list attribute",
            |s, _| {
                log::info!("setSourceListAttribute: input a display name by string.");
                let display_name = s.read_token();
                let items = samples::build_media_source_items_by_name(&display_name);
                s.with_provider("setSourceListAttribute", |p| {
                    p.set_source_list_attribute(items)
                });
            },
        )
        .register(
            26,
            "broadcastGeneralParametersUpdated",
            "Broadcast general parameters updated",
            |s, _| {
                log::info!(
                    "broadcastGeneralParametersUpdated: please set index ValidRange: [0, 1] (@0 for Lady Gaga, @others for 보아)."
                );
                let index = s.read_number("index", 0u32);
                let parameters = samples::build_pair_vector_with_index(index);
                s.with_provider("fireGeneralParametersUpdatedEvent", |p| {
                    p.fire_general_parameters_updated_event(parameters)
                });
            },
        )
        .register(
            27,
            "broadcastBrowserQueryKeepAliveEvent",
            "Broadcast browser query keep alive event",
            |s, case| {
                log::info!("broadcastBrowserQueryKeepAliveEvent: input the view identifier by uint8_t.");
                let view_id = s.read_view_id(&case);
                s.with_provider("fireBrowserQueryKeepAliveEvent", |p| {
                    p.fire_browser_query_keep_alive_event(view_id)
                });
            },
        )
        .register(
            28,
            "broadcastBrowserWindowChangedEvent",
            "Broadcast browser window change event",
            |s, _| {
                log::info!("broadcastBrowserWindowChangedEvent: input the event: [0, 5]");
                let raw = s.read_number("event", 0u32);
                let event = VmcWindowChangedEvent::from_index_wrapping(raw);
                log::info!("set vmcWindowChangedEvent: {event}");
                let result = VmcWindowChangedResult {
                    window_changed_event: event,
                    title: "Example Title".into(),
                    index_of_active_media: 1,
                    ..Default::default()
                };
                s.with_provider("fireBrowserWindowChangedEvent", |p| {
                    p.fire_browser_window_changed_event(result)
                });
            },
        )
        .register(
            29,
            "setMediaRestrictedModeAttribute",
            "Set media restricted mode attribute",
            |s, _| {
                log::info!(
                    "setMediaRestrictedModeAttribute: ValidRange: [0, 1] (0 for unrestricted, 1 for restricted)"
                );
                println!("Enter media restricted mode (0 or 1): ");
                let raw = s.read_number("mediaRestrictedMode", 0u32);
                let mode = VmcMediaRestrictedMode::from_index(raw).unwrap_or_else(|| {
                    log::warn!("Unexpected mediaRestrictedMode value: {raw}, use unrestricted");
                    VmcMediaRestrictedMode::Unrestricted
                });
                s.with_provider("setMediaRestrictedModeAttribute", |p| {
                    p.set_media_restricted_mode_attribute(mode)
                });
            },
        );
    registry
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn input(text: &str) -> Input {
        Input::new(Cursor::new(text.as_bytes().to_vec()))
    }

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn tokens_span_lines() {
        let mut input = input("-o 8 15\n42\n");
        assert_eq!(input.next_line().unwrap(), tokens("-o 8 15"));
        assert_eq!(input.next_token().as_deref(), Some("42"));
        assert!(input.next_token().is_none());
        assert!(input.next_line().is_none());
    }

    #[test]
    fn leftover_tokens_come_back_as_line() {
        let mut input = input("1 2 3\n");
        assert_eq!(input.next_token().as_deref(), Some("1"));
        assert_eq!(input.next_line().unwrap(), tokens("2 3"));
    }

    #[test]
    fn unread_tokens_come_first() {
        let mut input = input("c\n");
        input.unread(tokens("a b"));
        assert_eq!(input.next_token().as_deref(), Some("a"));
        assert_eq!(input.next_line().unwrap(), tokens("b"));
        assert_eq!(input.next_token().as_deref(), Some("c"));
    }

    #[test]
    fn line_options_parse() {
        let args = LineArgs::try_parse_from(["vmc", "-o", "1", "--sourceId", "usb"]).unwrap();
        assert_eq!(args.option, Some(1));
        assert_eq!(args.source_id.as_deref(), Some("usb"));

        let args = LineArgs::try_parse_from(["vmc", "-h", "-e"]).unwrap();
        assert!(args.help && args.exit);

        let args = LineArgs::try_parse_from(["vmc", "-o", "8", "1500"]).unwrap();
        assert_eq!(args.answers, ["1500"]);

        assert!(LineArgs::try_parse_from(["vmc", "-o", "abc"]).is_err());
    }

    #[test]
    fn stray_tokens_are_reported() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let broker = Broker::with_handle(rt.handle().clone());
        let mut session = Session::new(&broker, None, input(""), config::HU_INSTANCE);
        let registry = commands();

        for line in ["hello", "hello world", "--sourceId usb", "-o 77"] {
            assert_eq!(
                handle_line(&mut session, &registry, &tokens(line)),
                LoopState::Unrecognized,
                "{line}"
            );
        }
        assert_eq!(
            handle_line(&mut session, &registry, &tokens("")),
            LoopState::Continue
        );
    }

    #[test]
    fn leftover_answers_surface_as_unknown_input() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let broker = Broker::with_handle(rt.handle().clone());
        let mut session = Session::new(&broker, None, input(""), config::HU_INSTANCE);
        let registry = commands();

        // isAvailable prompts for nothing, so "foo" is left over
        assert_eq!(
            handle_line(&mut session, &registry, &tokens("-o 0 foo")),
            LoopState::Continue
        );
        let leftover = session.input.next_line().unwrap();
        assert_eq!(
            handle_line(&mut session, &registry, &leftover),
            LoopState::Unrecognized
        );
    }

    #[test]
    fn menu_has_thirty_commands() {
        let registry = commands();
        assert_eq!(registry.len(), 30);
        for id in 0..30u32 {
            let by_id = registry.resolve(&id.to_string()).unwrap();
            let by_name = registry.resolve(by_id.name).unwrap();
            assert!(std::ptr::eq(by_id, by_name));
        }
        assert!(registry.resolve("999").is_none());
    }
}
