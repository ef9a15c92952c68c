use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_render::{request_animation_frame, AnimationFrame};
use wasm_bindgen::JsCast;
use web_sys::{window, CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};
use yew::prelude::*;

use crate::hooks::viewport_size;
use crate::squares::{
    DriftDirection, FieldConfig, SquareField, DEFAULT_DRIFT_SPEED, DEFAULT_SQUARE_SIZE,
};

#[derive(Properties, PartialEq)]
pub struct SquaresProps {
    #[prop_or(DEFAULT_DRIFT_SPEED)]
    pub speed: f64,
    #[prop_or(DEFAULT_SQUARE_SIZE)]
    pub square_size: f64,
    #[prop_or_default]
    pub direction: DriftDirection,
    #[prop_or(AttrValue::Static("#fff"))]
    pub border_color: AttrValue,
    #[prop_or(AttrValue::Static("#222"))]
    pub hover_fill_color: AttrValue,
    #[prop_or_default]
    pub class: Classes,
}

struct SquaresDriver {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    field: RefCell<SquareField>,
    pointer: Cell<Option<(f64, f64)>>,
    border_color: String,
    hover_fill_color: String,
    frame: RefCell<Option<AnimationFrame>>,
}

impl SquaresDriver {
    /// Resyncs the drawing surface's pixel dimensions to the viewport.
    /// Square coordinates are deliberately left alone.
    fn sync_surface_size(&self) {
        let (width, height) = viewport_size();
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.field.borrow_mut().resize(width, height);
    }

    fn render_frame(&self) {
        let width = f64::from(self.canvas.width());
        let height = f64::from(self.canvas.height());
        self.context.clear_rect(0.0, 0.0, width, height);

        let mut field = self.field.borrow_mut();
        field.step(self.pointer.get());

        for square in field.squares() {
            self.context.save();
            self.context.set_global_alpha(square.opacity);
            self.context.set_stroke_style_str(&self.border_color);
            self.context.set_line_width(1.0);
            self.context
                .stroke_rect(square.x, square.y, square.size, square.size);

            if square.hovered {
                self.context.set_fill_style_str(&self.hover_fill_color);
                self.context
                    .fill_rect(square.x, square.y, square.size, square.size);
            }

            self.context.restore();
        }
    }
}

fn schedule_frames(driver: Rc<SquaresDriver>) {
    let next = Rc::clone(&driver);
    let handle = request_animation_frame(move |_timestamp| {
        next.render_frame();
        schedule_frames(next);
    });
    *driver.frame.borrow_mut() = Some(handle);
}

fn build_driver(
    canvas_ref: &NodeRef,
    config: FieldConfig,
    border_color: String,
    hover_fill_color: String,
) -> Option<Rc<SquaresDriver>> {
    let canvas = canvas_ref.cast::<HtmlCanvasElement>()?;
    // A surface without a 2D context renders nothing; the page itself is
    // unaffected.
    let context = canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()?;

    let (width, height) = viewport_size();
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);

    let field = SquareField::new(width, height, config, || js_sys::Math::random());

    Some(Rc::new(SquaresDriver {
        canvas,
        context,
        field: RefCell::new(field),
        pointer: Cell::new(None),
        border_color,
        hover_fill_color,
        frame: RefCell::new(None),
    }))
}

fn attach_listeners(driver: &Rc<SquaresDriver>) -> Vec<EventListener> {
    let Some(win) = window() else {
        return Vec::new();
    };

    let resize = {
        let driver = Rc::clone(driver);
        EventListener::new(&win, "resize", move |_event| driver.sync_surface_size())
    };

    // The canvas sits beneath the page and ignores pointer events itself, so
    // the pointer is tracked on the window and translated into canvas
    // coordinates.
    let pointer = {
        let driver = Rc::clone(driver);
        EventListener::new(&win, "mousemove", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let rect = driver.canvas.get_bounding_client_rect();
                driver.pointer.set(Some((
                    f64::from(event.client_x()) - rect.left(),
                    f64::from(event.client_y()) - rect.top(),
                )));
            }
        })
    };

    vec![resize, pointer]
}

/// Full-viewport decorative background of drifting bordered squares, drawn
/// beneath the page content and cancelled on unmount.
#[function_component(Squares)]
pub fn squares(props: &SquaresProps) -> Html {
    let canvas_ref = use_node_ref();

    {
        let canvas_ref = canvas_ref.clone();
        let config = FieldConfig {
            speed: props.speed,
            size: props.square_size,
            direction: props.direction,
        };
        let border_color = props.border_color.to_string();
        let hover_fill_color = props.hover_fill_color.to_string();

        use_effect_with(
            (
                props.speed,
                props.square_size,
                props.direction,
                props.border_color.clone(),
                props.hover_fill_color.clone(),
            ),
            move |_| {
                let mut running = None::<(Rc<SquaresDriver>, Vec<EventListener>)>;

                if let Some(driver) =
                    build_driver(&canvas_ref, config, border_color, hover_fill_color)
                {
                    let listeners = attach_listeners(&driver);
                    schedule_frames(Rc::clone(&driver));
                    running = Some((driver, listeners));
                }

                move || {
                    if let Some((driver, listeners)) = running {
                        // Dropping the pending frame handle cancels the loop;
                        // the listeners cancel the same way.
                        driver.frame.borrow_mut().take();
                        drop(listeners);
                    }
                }
            },
        );
    }

    html! {
        <canvas
            ref={canvas_ref}
            class={classes!("squares-canvas", props.class.clone())}
            aria-hidden="true"
        />
    }
}
