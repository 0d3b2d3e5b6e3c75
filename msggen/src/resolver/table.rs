//! Type table: what the resolver knows about specific types.
//!
//! The built-in table covers the container templates and runtime types the
//! IPC layer ships with. Builds can extend it through a
//! [`TypeTableExtension`] (deserialized from the `[types]` section of the
//! configuration file) without touching resolver logic.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{GenerateError, GenerateResult};

// =============================================================================
// Header
// =============================================================================

/// An include target, stored with its delimiters: `"Connection.h"` or `<wtf/Vector.h>`.
///
/// Ordering is plain string ordering, which puts quoted includes before
/// angle-bracket ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Header(String);

impl Header {
    /// A project header, `"name"`.
    pub fn quoted(name: impl AsRef<str>) -> Self {
        Header(format!("\"{}\"", name.as_ref()))
    }

    /// A system or framework header, `<name>`.
    pub fn system(name: impl AsRef<str>) -> Self {
        Header(format!("<{}>", name.as_ref()))
    }

    /// Parse a delimited header such as `"Foo.h"` or `<wtf/Foo.h>`.
    pub fn parse(header: &str) -> GenerateResult<Self> {
        let header = header.trim();
        let valid = header.len() > 2
            && ((header.starts_with('"') && header.ends_with('"'))
                || (header.starts_with('<') && header.ends_with('>')));
        if valid {
            Ok(Header(header.to_string()))
        } else {
            Err(GenerateError::InvalidHeader {
                header: header.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Table
// =============================================================================

/// Headers a supported class template needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    /// Headers declaring the template itself.
    pub headers: Vec<Header>,

    /// Headers providing its argument coders.
    pub coder_headers: Vec<Header>,
}

/// Registry of per-type resolution policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    /// Supported class templates by outer name.
    pub templates: BTreeMap<String, TemplateInfo>,

    /// Types needing specific headers, keyed by fully qualified name.
    pub type_headers: BTreeMap<String, Vec<Header>>,

    /// Types whose argument coders live in a specific header.
    pub coder_headers: BTreeMap<String, Header>,

    /// Coder header shared by every type in a namespace.
    pub namespace_coder_headers: BTreeMap<String, Header>,

    /// Types that need a full definition even where a forward declaration would do.
    pub no_forward_declaration: BTreeSet<String>,

    /// `WTF` types that parameters may name without their namespace.
    pub wtf_types: BTreeSet<String>,

    /// Namespaces whose headers are included with quotes rather than angle brackets.
    pub quoted_namespaces: BTreeSet<String>,

    /// Types passed by value rather than by `const&`.
    pub by_value_types: BTreeSet<String>,

    /// Fixed platform guards for headers that only exist on some platforms.
    pub header_conditions: BTreeMap<Header, Vec<String>>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TypeTable {
    /// A table that knows nothing.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
            type_headers: BTreeMap::new(),
            coder_headers: BTreeMap::new(),
            namespace_coder_headers: BTreeMap::new(),
            no_forward_declaration: BTreeSet::new(),
            wtf_types: BTreeSet::new(),
            quoted_namespaces: BTreeSet::new(),
            by_value_types: BTreeSet::new(),
            header_conditions: BTreeMap::new(),
        }
    }

    /// The table for the stock IPC runtime.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        let argument_coders = Header::quoted("ArgumentCoders.h");

        for (name, header) in BUILTIN_TEMPLATES {
            table.templates.insert(
                name.to_string(),
                TemplateInfo {
                    headers: vec![parse_builtin(header)],
                    coder_headers: vec![argument_coders.clone()],
                },
            );
        }
        for (type_name, headers) in BUILTIN_TYPE_HEADERS {
            table.type_headers.insert(
                type_name.to_string(),
                headers.iter().map(|h| parse_builtin(h)).collect(),
            );
        }
        table
            .coder_headers
            .insert("String".to_string(), argument_coders.clone());
        table.coder_headers.insert(
            "PurcFetcher::ScriptMessageHandlerHandle".to_string(),
            Header::quoted("WebScriptMessageHandler.h"),
        );
        table.namespace_coder_headers.insert(
            "PurcFetcher".to_string(),
            Header::quoted("WebCoreArgumentCoders.h"),
        );
        table.no_forward_declaration = BUILTIN_NO_FORWARD_DECLARATION
            .iter()
            .map(|t| t.to_string())
            .collect();
        table.wtf_types = BUILTIN_WTF_TYPES.iter().map(|t| t.to_string()).collect();
        table.quoted_namespaces = ["PurcFetcher", "IPC"].iter().map(|n| n.to_string()).collect();
        table.by_value_types = BY_VALUE_TYPES.iter().map(|t| t.to_string()).collect();
        for (header, conditions) in BUILTIN_HEADER_CONDITIONS {
            table.header_conditions.insert(
                parse_builtin(header),
                conditions.iter().map(|c| c.to_string()).collect(),
            );
        }
        table
    }

    /// Merge an extension into this table. Extension entries replace built-in ones.
    pub fn extend(&mut self, extension: TypeTableExtension) -> GenerateResult<()> {
        for (name, entry) in extension.templates {
            let coder_headers = if entry.coder_headers.is_empty() {
                vec![Header::quoted("ArgumentCoders.h")]
            } else {
                parse_all(&entry.coder_headers)?
            };
            self.templates.insert(
                name,
                TemplateInfo {
                    headers: parse_all(&entry.headers)?,
                    coder_headers,
                },
            );
        }
        for (type_name, headers) in extension.headers {
            self.type_headers.insert(type_name, parse_all(&headers)?);
        }
        for (type_name, header) in extension.coder_headers {
            self.coder_headers.insert(type_name, Header::parse(&header)?);
        }
        for (namespace, header) in extension.namespace_coder_headers {
            self.namespace_coder_headers
                .insert(namespace, Header::parse(&header)?);
        }
        for (header, conditions) in extension.header_conditions {
            self.header_conditions
                .insert(Header::parse(&header)?, conditions);
        }
        self.no_forward_declaration
            .extend(extension.no_forward_declaration);
        self.wtf_types.extend(extension.wtf_types);
        self.quoted_namespaces.extend(extension.quoted_namespaces);
        self.by_value_types.extend(extension.by_value_types);
        Ok(())
    }

    /// Builder-style [`TypeTable::extend`].
    pub fn with_extension(mut self, extension: TypeTableExtension) -> GenerateResult<Self> {
        self.extend(extension)?;
        Ok(self)
    }

    pub fn template(&self, name: &str) -> Option<&TemplateInfo> {
        self.templates.get(name)
    }

    pub fn is_by_value(&self, type_name: &str) -> bool {
        self.by_value_types.contains(type_name)
    }
}

/// Additions to the type table, as written in configuration.
///
/// ```toml
/// [types.templates.Ref]
/// headers = ["<wtf/Ref.h>"]
///
/// [types.headers]
/// "PurcFetcher::Cookie" = ["<Cookie.h>"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeTableExtension {
    pub templates: BTreeMap<String, TemplateEntry>,
    pub headers: BTreeMap<String, Vec<String>>,
    pub coder_headers: BTreeMap<String, String>,
    pub namespace_coder_headers: BTreeMap<String, String>,
    pub no_forward_declaration: Vec<String>,
    pub wtf_types: Vec<String>,
    pub quoted_namespaces: Vec<String>,
    pub by_value_types: Vec<String>,
    pub header_conditions: BTreeMap<String, Vec<String>>,
}

/// A template entry in a [`TypeTableExtension`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateEntry {
    pub headers: Vec<String>,
    /// Defaults to `"ArgumentCoders.h"` when empty.
    pub coder_headers: Vec<String>,
}

impl TypeTableExtension {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_all(headers: &[String]) -> GenerateResult<Vec<Header>> {
    headers.iter().map(|h| Header::parse(h)).collect()
}

/// Built-in entries are written with their delimiters and always well formed.
fn parse_builtin(header: &str) -> Header {
    Header(header.to_string())
}

// =============================================================================
// Built-in data
// =============================================================================

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("PurcFetcher::RectEdges", "<RectEdges.h>"),
    ("Expected", "<wtf/Expected.h>"),
    ("HashMap", "<wtf/HashMap.h>"),
    ("HashSet", "<wtf/HashSet.h>"),
    ("Optional", "<wtf/Optional.h>"),
    ("OptionSet", "<wtf/OptionSet.h>"),
    ("Vector", "<wtf/Vector.h>"),
    ("std::pair", "<utility>"),
];

const BY_VALUE_TYPES: &[&str] = &[
    "bool", "float", "double", "uint8_t", "uint16_t", "uint32_t", "uint64_t", "int8_t", "int16_t",
    "int32_t", "int64_t",
];

const BUILTIN_HEADER_CONDITIONS: &[(&str, &[&str])] = &[
    (
        "\"InputMethodState.h\"",
        &["PLATFORM(GTK)", "PLATFORM(WPE)", "PLATFORM(HBD)"],
    ),
    ("\"LayerHostingContext.h\"", &["PLATFORM(COCOA)"]),
    ("\"GestureTypes.h\"", &["PLATFORM(IOS_FAMILY)"]),
];

const BUILTIN_WTF_TYPES: &[&str] = &["MachSendRight", "MediaType", "String"];

const BUILTIN_NO_FORWARD_DECLARATION: &[&str] = &[
    "MachSendRight",
    "MediaTime",
    "String",
    "PurcFetcher::ActivityStateChangeID",
    "PurcFetcher::AudioMediaStreamTrackRendererIdentifier",
    "PurcFetcher::ColorSpace",
    "PurcFetcher::ContentWorldIdentifier",
    "PurcFetcher::DictationContext",
    "PurcFetcher::DisplayLinkObserverID",
    "PurcFetcher::DocumentIdentifier",
    "PurcFetcher::DocumentOrWorkerIdentifier",
    "PurcFetcher::FetchIdentifier",
    "PurcFetcher::FrameIdentifier",
    "PurcFetcher::GeolocationIdentifier",
    "PurcFetcher::ImageBufferBackendHandle",
    "PurcFetcher::ImageBufferFlushIdentifier",
    "PurcFetcher::ImageBufferIdentifier",
    "PurcFetcher::LayerHostingContextID",
    "PurcFetcher::LegacyCustomProtocolID",
    "PurcFetcher::LibWebRTCResolverIdentifier",
    "PurcFetcher::LibWebRTCSocketIdentifier",
    "PurcFetcher::MDNSRegisterIdentifier",
    "PurcFetcher::MediaPlayerPrivateRemoteIdentifier",
    "PurcFetcher::MediaRecorderIdentifier",
    "PurcFetcher::MediaSessionIdentifier",
    "PurcFetcher::PageIdentifier",
    "PurcFetcher::PluginLoadClientPolicy",
    "PurcFetcher::PluginProcessType",
    "PurcFetcher::PointerID",
    "PurcFetcher::ProcessIdentifier",
    "PurcFetcher::RTCDecoderIdentifier",
    "PurcFetcher::RTCEncoderIdentifier",
    "PurcFetcher::RealtimeMediaSourceIdentifier",
    "PurcFetcher::RemoteAudioDestinationIdentifier",
    "PurcFetcher::RemoteAudioSessionIdentifier",
    "PurcFetcher::RemoteCDMIdentifier",
    "PurcFetcher::RemoteCDMInstanceIdentifier",
    "PurcFetcher::RemoteCDMInstanceSessionIdentifier",
    "PurcFetcher::RemoteLegacyCDMIdentifier",
    "PurcFetcher::RemoteLegacyCDMSessionIdentifier",
    "PurcFetcher::RemoteMediaResourceIdentifier",
    "PurcFetcher::RenderingBackendIdentifier",
    "PurcFetcher::RenderingMode",
    "PurcFetcher::SWServerConnectionIdentifier",
    "PurcFetcher::SampleBufferDisplayLayerIdentifier",
    "PurcFetcher::ServiceWorkerIdentifier",
    "PurcFetcher::ServiceWorkerJobIdentifier",
    "PurcFetcher::ServiceWorkerOrClientData",
    "PurcFetcher::ServiceWorkerOrClientIdentifier",
    "PurcFetcher::ServiceWorkerRegistrationIdentifier",
    "PurcFetcher::SharedStringHash",
    "PurcFetcher::SleepDisablerIdentifier",
    "PurcFetcher::StorageAreaIdentifier",
    "PurcFetcher::StorageAreaImplIdentifier",
    "PurcFetcher::StorageNamespaceIdentifier",
    "PurcFetcher::TrackPrivateRemoteIdentifier",
    "PurcFetcher::TransactionID",
    "PurcFetcher::UserContentControllerIdentifier",
    "PurcFetcher::WebPageProxyIdentifier",
    "PurcFetcher::WebSocketIdentifier",
];

const BUILTIN_TYPE_HEADERS: &[(&str, &[&str])] = &[
    ("IPC::SharedBufferDataReference", &["\"SharedBufferDataReference.h\"", "\"DataReference.h\""]),
    ("Inspector::FrontendChannel::ConnectionType", &["<JavaScriptCore/InspectorFrontendChannel.h>"]),
    ("Inspector::InspectorTargetType", &["<JavaScriptCore/InspectorTarget.h>"]),
    ("JSC::MessageLevel", &["<JavaScriptCore/ConsoleTypes.h>"]),
    ("JSC::MessageSource", &["<JavaScriptCore/ConsoleTypes.h>"]),
    ("MachSendRight", &["<wtf/MachSendRight.h>"]),
    ("MediaTime", &["<wtf/MediaTime.h>"]),
    ("MonotonicTime", &["<wtf/MonotonicTime.h>"]),
    ("PAL::SessionID", &["<pal/SessionID.h>"]),
    ("Seconds", &["<wtf/Seconds.h>"]),
    ("String", &["<wtf/text/WTFString.h>"]),
    ("WallTime", &["<wtf/WallTime.h>"]),
    ("PurcFetcher::ActivityStateChangeID", &["\"DrawingAreaInfo.h\""]),
    ("PurcFetcher::AutoplayEventFlags", &["<AutoplayEvent.h>"]),
    ("PurcFetcher::BackForwardListItemState", &["\"SessionState.h\""]),
    ("PurcFetcher::ContentWorldIdentifier", &["\"ContentWorldShared.h\""]),
    ("PurcFetcher::DOMPasteAccessResponse", &["<DOMPasteAccess.h>"]),
    ("PurcFetcher::DocumentEditingContextRequest", &["\"DocumentEditingContext.h\""]),
    ("PurcFetcher::DocumentOrWorkerIdentifier", &["<ServiceWorkerTypes.h>"]),
    ("PurcFetcher::DragHandlingMethod", &["<DragActions.h>"]),
    ("PurcFetcher::DragOperation", &["<DragActions.h>"]),
    ("PurcFetcher::DragSourceAction", &["<DragActions.h>"]),
    ("PurcFetcher::ExceptionDetails", &["<JSDOMExceptionHandling.h>"]),
    ("PurcFetcher::FileChooserSettings", &["<FileChooser.h>"]),
    ("PurcFetcher::FirstPartyWebsiteDataRemovalMode", &["<NetworkStorageSession.h>"]),
    ("PurcFetcher::FontChanges", &["<FontAttributeChanges.h>"]),
    ("PurcFetcher::FrameLoadType", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::GenericCueData", &["<InbandGenericCue.h>"]),
    ("PurcFetcher::GestureRecognizerState", &["\"GestureTypes.h\""]),
    ("PurcFetcher::GestureType", &["\"GestureTypes.h\""]),
    ("PurcFetcher::GrammarDetail", &["<TextCheckerClient.h>"]),
    ("PurcFetcher::HasInsecureContent", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::Highlight", &["<InspectorOverlay.h>"]),
    ("PurcFetcher::ISOWebVTTCue", &["<ISOVTTCue.h>"]),
    ("PurcFetcher::IncludeSecureCookies", &["<CookieJar.h>"]),
    ("PurcFetcher::IndexedDB::ObjectStoreOverwriteMode", &["<IndexedDB.h>"]),
    ("PurcFetcher::InputMode", &["<InputMode.h>"]),
    ("PurcFetcher::KeyframeValueList", &["<GraphicsLayer.h>"]),
    ("PurcFetcher::KeypressCommand", &["<KeyboardEvent.h>"]),
    ("PurcFetcher::LayerHostingContextID", &["\"LayerHostingContext.h\""]),
    ("PurcFetcher::LayerHostingMode", &["\"LayerTreeContext.h\""]),
    ("PurcFetcher::LegacyCDMSessionClient::MediaKeyErrorCode", &["<LegacyCDMSession.h>"]),
    ("PurcFetcher::LockBackForwardList", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::MediaEngineSupportParameters", &["<MediaPlayer.h>"]),
    ("PurcFetcher::MessagePortChannelProvider::HasActivity", &["<MessagePortChannelProvider.h>"]),
    ("PurcFetcher::MouseEventPolicy", &["<DocumentLoader.h>"]),
    ("PurcFetcher::NetworkTransactionInformation", &["<NetworkLoadInformation.h>"]),
    ("PurcFetcher::PageState", &["\"SessionState.h\""]),
    ("PurcFetcher::PasteboardCustomData", &["<Pasteboard.h>"]),
    ("PurcFetcher::PasteboardImage", &["<Pasteboard.h>"]),
    ("PurcFetcher::PasteboardURL", &["<Pasteboard.h>"]),
    ("PurcFetcher::PasteboardWebContent", &["<Pasteboard.h>"]),
    ("PurcFetcher::PluginInfo", &["<PluginData.h>"]),
    ("PurcFetcher::PluginLoadClientPolicy", &["<PluginData.h>"]),
    ("PurcFetcher::PluginProcessType", &["\"PluginProcessAttributes.h\""]),
    ("PurcFetcher::PolicyAction", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::PolicyCheckIdentifier", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::ProcessIdentifier", &["<ProcessIdentifier.h>"]),
    ("PurcFetcher::RecentSearch", &["<SearchPopupMenu.h>"]),
    ("PurcFetcher::RequestStorageAccessResult", &["<DocumentStorageAccess.h>"]),
    ("PurcFetcher::RespectSelectionAnchor", &["\"GestureTypes.h\""]),
    ("PurcFetcher::RouteSharingPolicy", &["<AudioSession.h>"]),
    ("PurcFetcher::SWServerConnectionIdentifier", &["<ServiceWorkerTypes.h>"]),
    ("PurcFetcher::SameSiteStrictEnforcementEnabled", &["<NetworkStorageSession.h>"]),
    ("PurcFetcher::SelectionDirection", &["<VisibleSelection.h>"]),
    ("PurcFetcher::SelectionFlags", &["\"GestureTypes.h\""]),
    ("PurcFetcher::SelectionRect", &["\"EditorState.h\""]),
    ("PurcFetcher::SelectionTouch", &["\"GestureTypes.h\""]),
    ("PurcFetcher::ServiceWorkerJobIdentifier", &["<ServiceWorkerTypes.h>"]),
    (
        "PurcFetcher::ServiceWorkerOrClientData",
        &["<ServiceWorkerTypes.h>", "<ServiceWorkerClientData.h>", "<ServiceWorkerData.h>"],
    ),
    (
        "PurcFetcher::ServiceWorkerOrClientIdentifier",
        &["<ServiceWorkerTypes.h>", "<ServiceWorkerClientIdentifier.h>"],
    ),
    ("PurcFetcher::ServiceWorkerRegistrationIdentifier", &["<ServiceWorkerTypes.h>"]),
    ("PurcFetcher::ServiceWorkerRegistrationState", &["<ServiceWorkerTypes.h>"]),
    ("PurcFetcher::ServiceWorkerState", &["<ServiceWorkerTypes.h>"]),
    ("PurcFetcher::ShareDataWithParsedURL", &["<ShareData.h>"]),
    ("PurcFetcher::ShouldAskITP", &["<NetworkStorageSession.h>"]),
    ("PurcFetcher::ShouldContinuePolicyCheck", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::ShouldNotifyWhenResolved", &["<ServiceWorkerTypes.h>"]),
    ("PurcFetcher::ShouldSample", &["<DiagnosticLoggingClient.h>"]),
    ("PurcFetcher::StorageAccessPromptWasShown", &["<DocumentStorageAccess.h>"]),
    ("PurcFetcher::StorageAccessScope", &["<DocumentStorageAccess.h>"]),
    ("PurcFetcher::StorageAccessWasGranted", &["<DocumentStorageAccess.h>"]),
    ("PurcFetcher::SupportedPluginIdentifier", &["<PluginData.h>"]),
    ("PurcFetcher::SystemPreviewInfo", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::TextCheckingRequestData", &["<TextChecking.h>"]),
    ("PurcFetcher::TextCheckingResult", &["<TextCheckerClient.h>"]),
    ("PurcFetcher::TextCheckingType", &["<TextChecking.h>"]),
    ("PurcFetcher::TextIndicatorData", &["<TextIndicator.h>"]),
    ("PurcFetcher::ThirdPartyCookieBlockingMode", &["<NetworkStorageSession.h>"]),
    ("PurcFetcher::UsedLegacyTLS", &["<ResourceResponseBase.h>"]),
    ("PurcFetcher::ViewportAttributes", &["<ViewportArguments.h>"]),
    ("PurcFetcher::WebGLLoadPolicy", &["<FrameLoaderTypes.h>"]),
    ("PurcFetcher::WebGestureEvent", &["\"WebEvent.h\""]),
    ("PurcFetcher::WebKeyboardEvent", &["\"WebEvent.h\""]),
    ("PurcFetcher::WebMouseEvent", &["\"WebEvent.h\""]),
    ("PurcFetcher::WebTouchEvent", &["\"WebEvent.h\""]),
    ("PurcFetcher::WebWheelEvent", &["\"WebEvent.h\""]),
    ("PurcFetcher::WillContinueLoading", &["<FrameLoaderTypes.h>"]),
    ("webrtc::WebKitEncodedFrameInfo", &["<webrtc/sdk/PurcFetcher/WebKitEncoder.h>"]),
    ("webrtc::WebKitRTPFragmentationHeader", &["<webrtc/sdk/PurcFetcher/WebKitEncoder.h>"]),
];
