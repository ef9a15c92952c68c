use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_net::http::Request;
use gloo_timers::callback::Timeout;
use js_sys::{Array, Date, Reflect};
use serde::de::DeserializeOwned;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, Element, Event, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};
use yew::prelude::*;

use crate::media::{LazyMedia, DEFAULT_ROOT_MARGIN_PX, DEFAULT_VISIBILITY_THRESHOLD};
use crate::scroll::ScrollActivity;

const COLLECTION_STALE_TIME_MS: f64 = 5.0 * 60.0 * 1000.0;

pub(crate) fn viewport_size() -> (f64, f64) {
    let Some(win) = window() else {
        return (1280.0, 720.0);
    };

    let width = win
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(1280.0);
    let height = win
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(720.0);

    (width, height)
}

fn intersection_observer_available() -> bool {
    let Some(win) = window() else {
        return false;
    };

    Reflect::get(&win, &JsValue::from_str("IntersectionObserver"))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false)
}

/// One-shot viewport visibility: flips to true the first time `node` meets
/// `threshold` within `root_margin_px` of the viewport edge, then releases
/// the observation. When the observer primitive is missing the hook fails
/// open and reports immediate visibility, so content is never permanently
/// hidden.
#[hook]
pub fn use_in_view(node: NodeRef, threshold: f64, root_margin_px: u32, enabled: bool) -> bool {
    let in_view = use_state(|| false);

    {
        let in_view = in_view.clone();
        use_effect_with(
            (node, threshold, root_margin_px, enabled),
            move |(node, threshold, root_margin_px, enabled)| {
                let mut observation: Option<(
                    IntersectionObserver,
                    Closure<dyn FnMut(Array, IntersectionObserver)>,
                )> = None;

                if *enabled && !*in_view {
                    match node.cast::<Element>() {
                        Some(element) if intersection_observer_available() => {
                            let on_intersect = {
                                let in_view = in_view.clone();
                                Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
                                    move |entries: Array, observer: IntersectionObserver| {
                                        let intersecting = entries.iter().any(|entry| {
                                            entry
                                                .dyn_into::<IntersectionObserverEntry>()
                                                .map(|entry| entry.is_intersecting())
                                                .unwrap_or(false)
                                        });

                                        if intersecting {
                                            in_view.set(true);
                                            observer.disconnect();
                                        }
                                    },
                                )
                            };

                            let options = IntersectionObserverInit::new();
                            options.set_threshold(&JsValue::from_f64(*threshold));
                            options.set_root_margin(&format!("{root_margin_px}px"));

                            match IntersectionObserver::new_with_options(
                                on_intersect.as_ref().unchecked_ref(),
                                &options,
                            ) {
                                Ok(observer) => {
                                    observer.observe(&element);
                                    observation = Some((observer, on_intersect));
                                }
                                Err(_) => in_view.set(true),
                            }
                        }
                        // No observer primitive, or the node is not mounted:
                        // fail open rather than leaving the media unloaded.
                        _ => in_view.set(true),
                    }
                }

                move || {
                    if let Some((observer, _on_intersect)) = observation {
                        observer.disconnect();
                    }
                }
            },
        );
    }

    *in_view
}

#[derive(Clone, PartialEq)]
pub struct LazyImageConfig {
    pub src: AttrValue,
    pub placeholder: Option<AttrValue>,
    pub threshold: f64,
    pub root_margin_px: u32,
    pub should_pause: bool,
}

impl LazyImageConfig {
    pub fn new(src: AttrValue) -> Self {
        Self {
            src,
            placeholder: None,
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
            root_margin_px: DEFAULT_ROOT_MARGIN_PX,
            should_pause: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: AttrValue) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn paused_while(mut self, should_pause: bool) -> Self {
        self.should_pause = should_pause;
        self
    }
}

pub struct LazyImageHandle {
    pub node: NodeRef,
    /// What the `<img>` should currently point at; `None` until there is a
    /// placeholder or a revealed source.
    pub src: Option<AttrValue>,
    pub is_loaded: bool,
    pub is_in_view: bool,
    pub onload: Callback<Event>,
    pub onerror: Callback<Event>,
}

/// Drives a [`LazyMedia`] element from viewport visibility and the media
/// load/error events of the rendered `<img>`.
#[hook]
pub fn use_lazy_image(config: LazyImageConfig) -> LazyImageHandle {
    let node = use_node_ref();
    let media = {
        let src = config.src.clone();
        let placeholder = config.placeholder.clone();
        use_state(move || LazyMedia::new(src.to_string(), placeholder.map(|p| p.to_string())))
    };
    let in_view = use_in_view(
        node.clone(),
        config.threshold,
        config.root_margin_px,
        !config.should_pause,
    );

    // The reveal is re-evaluated whenever visibility or the pause gate
    // changes, so a pause lifted after the element became visible still
    // triggers the load.
    {
        let media = media.clone();
        use_effect_with(
            (in_view, config.should_pause),
            move |(in_view, should_pause)| {
                if *in_view {
                    let mut next = (*media).clone();
                    if next.reveal(*should_pause) {
                        media.set(next);
                    }
                }
                || ()
            },
        );
    }

    let onload = {
        let media = media.clone();
        Callback::from(move |_: Event| {
            let mut next = (*media).clone();
            if next.mark_loaded() {
                media.set(next);
            }
        })
    };

    let onerror = {
        let media = media.clone();
        Callback::from(move |_: Event| {
            let mut next = (*media).clone();
            if next.mark_errored() {
                media.set(next);
            }
        })
    };

    LazyImageHandle {
        node,
        src: media
            .current_source()
            .map(|source| AttrValue::from(source.to_string())),
        is_loaded: media.is_loaded(),
        is_in_view: in_view,
        onload,
        onerror,
    }
}

#[derive(Clone, Copy, PartialEq)]
pub struct ScrollActivityHandle {
    pub is_scrolling: bool,
    pub should_pause: bool,
    pub should_load_content: bool,
}

/// Global scroll activity, sampled through the leading-edge throttle in
/// [`crate::scroll`]. The listener is passive (gloo's default) so scroll
/// handling never delays the browser's own scroll rendering, and teardown
/// drops both the listener and any armed settle timer.
#[hook]
pub fn use_scroll_activity() -> ScrollActivityHandle {
    let scrolling = use_state(|| false);

    {
        let scrolling = scrolling.clone();
        use_effect_with((), move |_| {
            let activity = Rc::new(RefCell::new(ScrollActivity::new()));
            let settle_timer: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));

            let listener = window().map(|win| {
                let activity = Rc::clone(&activity);
                let settle_timer = Rc::clone(&settle_timer);
                let scrolling = scrolling.clone();

                EventListener::new(&win, "scroll", move |_event| {
                    let now_ms = Date::now() as u64;
                    if !activity.borrow_mut().on_scroll(now_ms) {
                        return;
                    }

                    scrolling.set(true);

                    // Re-arm the quiet-period timer; dropping the previous
                    // one cancels it, so only the latest sample's timer can
                    // fire.
                    let delay_ms = activity.borrow().settle_delay_ms() as u32;
                    let settle_activity = Rc::clone(&activity);
                    let settle_scrolling = scrolling.clone();
                    *settle_timer.borrow_mut() = Some(Timeout::new(delay_ms, move || {
                        settle_activity.borrow_mut().settle();
                        settle_scrolling.set(false);
                    }));
                })
            });

            move || {
                drop(listener);
                settle_timer.borrow_mut().take();
            }
        });
    }

    let is_scrolling = *scrolling;
    ScrollActivityHandle {
        is_scrolling,
        should_pause: is_scrolling,
        should_load_content: !is_scrolling,
    }
}

struct CachedCollection {
    fetched_at_ms: f64,
    payload: serde_json::Value,
}

thread_local! {
    static COLLECTION_CACHE: RefCell<HashMap<&'static str, CachedCollection>> =
        RefCell::new(HashMap::new());
}

#[derive(serde::Deserialize)]
struct CollectionResponse {
    ok: bool,
    #[serde(default)]
    items: serde_json::Value,
}

fn read_fresh_cached(path: &'static str) -> Option<serde_json::Value> {
    COLLECTION_CACHE.with(|cache| {
        let cache = cache.borrow();
        let cached = cache.get(path)?;

        if Date::now() - cached.fetched_at_ms <= COLLECTION_STALE_TIME_MS {
            Some(cached.payload.clone())
        } else {
            None
        }
    })
}

fn store_cached(path: &'static str, payload: serde_json::Value) {
    COLLECTION_CACHE.with(|cache| {
        cache.borrow_mut().insert(
            path,
            CachedCollection {
                fetched_at_ms: Date::now(),
                payload,
            },
        );
    });
}

async fn fetch_collection_items(path: &'static str) -> serde_json::Value {
    if let Some(cached) = read_fresh_cached(path) {
        return cached;
    }

    let fetched = async {
        let response = Request::get(path).send().await.ok()?;
        let payload = response.json::<CollectionResponse>().await.ok()?;

        if payload.ok {
            Some(payload.items)
        } else {
            None
        }
    }
    .await
    .unwrap_or(serde_json::Value::Array(Vec::new()));

    store_cached(path, fetched.clone());
    fetched
}

/// Fetches one content collection from the site API, with a stale-time cache
/// so remounting a section within five minutes does not refetch. `None`
/// while the request is in flight; a failed fetch resolves to an empty list.
#[hook]
pub fn use_collection<T>(path: &'static str) -> UseStateHandle<Option<Vec<T>>>
where
    T: DeserializeOwned + 'static,
{
    let items = use_state(|| None::<Vec<T>>);

    {
        let items = items.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                let payload = fetch_collection_items(path).await;
                let decoded = serde_json::from_value::<Vec<T>>(payload).unwrap_or_default();
                items.set(Some(decoded));
            });
            || ()
        });
    }

    items
}
