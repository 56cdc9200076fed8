//! Browser entry point for the events page.
//!
//! Reads the injected `window.API_BASE` once, binds the refresh button and
//! both forms to the view controller, and performs the initial load. Every
//! user action runs as its own local future; nothing orders them.

use std::{future::Future, rc::Rc};

use client_core::{
    ApiConfig, FormKind, HttpEventsApi, ViewController, EVENTS_LIST_ID, REFRESH_BUTTON_ID,
};
use shared::domain::FormPayload;
use tracing::{error, info, warn};
use url::Url;
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, DocumentReadyState, Event, Window};

mod dom;

use dom::{element_by_id, form_by_id, form_payload, DomView};

type Controller = ViewController<HttpEventsApi, DomView>;

const API_BASE_GLOBAL: &str = "API_BASE";

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;
    let config = api_config(&window);
    info!(base_url = config.base_url(), "events page starting");

    if document.ready_state() == DocumentReadyState::Loading {
        let listener_document = document.clone();
        let on_ready = Closure::once_into_js(move || {
            if let Err(err) = mount(window, listener_document, config) {
                error!(?err, "failed to mount events page");
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
        Ok(())
    } else {
        mount(window, document, config)
    }
}

fn api_config(window: &Window) -> ApiConfig {
    let injected = js_sys::Reflect::get(window, &JsValue::from_str(API_BASE_GLOBAL))
        .ok()
        .and_then(|value| value.as_string());
    let page = window.location().href().unwrap_or_default();
    resolve_api_base(injected.as_deref(), &page)
}

/// Resolves the injected base the way `fetch` resolves a relative request
/// URL: against the current page. A missing or empty base means the page
/// origin. The HTTP client needs absolute URLs.
pub fn resolve_api_base(injected: Option<&str>, page_href: &str) -> ApiConfig {
    let base = injected.map(str::trim).unwrap_or_default();
    let page = match Url::parse(page_href) {
        Ok(page) => page,
        Err(err) => {
            warn!(%err, page_href, "page url is not absolute; using api base as given");
            return ApiConfig::new(base);
        }
    };
    if base.is_empty() {
        return ApiConfig::new(page.origin().ascii_serialization());
    }
    match page.join(base) {
        Ok(resolved) => ApiConfig::new(resolved.as_str()),
        Err(err) => {
            warn!(%err, base, "api base does not resolve against the page; using it as given");
            ApiConfig::new(base)
        }
    }
}

fn mount(window: Window, document: Document, config: ApiConfig) -> Result<(), JsValue> {
    let list = element_by_id(&document, EVENTS_LIST_ID)?;
    let view = DomView::new(window, document.clone(), list);
    let controller: Rc<Controller> =
        Rc::new(ViewController::new(HttpEventsApi::new(config), view));

    bind_refresh(&document, controller.clone())?;
    bind_submit(
        &document,
        FormKind::CreateEvent,
        controller.clone(),
        |controller, payload| async move {
            let _ = controller.create_event(&payload).await;
        },
    )?;
    bind_submit(
        &document,
        FormKind::Subscribe,
        controller.clone(),
        |controller, payload| async move {
            let _ = controller.subscribe(&payload).await;
        },
    )?;

    spawn_local(async move { controller.initialize().await });
    Ok(())
}

fn bind_refresh(document: &Document, controller: Rc<Controller>) -> Result<(), JsValue> {
    let button = element_by_id(document, REFRESH_BUTTON_ID)?;
    let on_click = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        let controller = controller.clone();
        spawn_local(async move {
            let _ = controller.load_events().await;
        });
    });
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

fn bind_submit<F, Fut>(
    document: &Document,
    kind: FormKind,
    controller: Rc<Controller>,
    action: F,
) -> Result<(), JsValue>
where
    F: Fn(Rc<Controller>, FormPayload) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let form = form_by_id(document, kind.element_id())?;
    let submitted = form.clone();
    let on_submit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();
        match form_payload(&submitted) {
            Ok(payload) => spawn_local(action(controller.clone(), payload)),
            Err(err) => warn!(?err, form = kind.element_id(), "failed to read form fields"),
        }
    });
    form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;
    on_submit.forget();
    Ok(())
}
