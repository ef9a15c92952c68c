use gloo_events::EventListener;
use gloo_net::http::Request;
use gloo_timers::callback::Interval;
use serde::{Deserialize, Serialize};
use web_sys::{
    window, HtmlInputElement, HtmlTextAreaElement, ScrollBehavior, ScrollIntoViewOptions,
};
use yew::prelude::*;

use crate::canvas::Squares;
use crate::hooks::{use_collection, use_lazy_image, use_scroll_activity, LazyImageConfig};

const HERO_IMAGE: &str = "/assets/hero-portrait.png";
const HERO_IMAGE_PLACEHOLDER: &str = "/assets/hero-portrait-thumb.png";
const NAV_SCROLLED_THRESHOLD_PX: f64 = 50.0;
const TESTIMONIAL_ADVANCE_INTERVAL_MS: u32 = 6_000;
const READING_WORDS_PER_MINUTE: usize = 200;

#[derive(Clone, PartialEq, Deserialize)]
struct Project {
    id: String,
    title: String,
    description: String,
    image_url: Option<String>,
    #[serde(default)]
    tech_stack: Vec<String>,
    live_url: Option<String>,
    github_url: Option<String>,
    #[serde(default)]
    featured: bool,
}

#[derive(Clone, PartialEq, Deserialize)]
struct BlogPost {
    id: String,
    title: String,
    excerpt: Option<String>,
    author: String,
    published_at: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Clone, PartialEq, Deserialize)]
struct Testimonial {
    id: String,
    client_name: String,
    client_company: Option<String>,
    client_role: Option<String>,
    testimonial_text: String,
    rating: Option<u32>,
}

fn prefers_reduced_motion() -> bool {
    window()
        .and_then(|w| {
            w.match_media("(prefers-reduced-motion: reduce)")
                .ok()
                .flatten()
        })
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

fn scroll_to_section(anchor: &str) {
    let Some(document) = window().and_then(|w| w.document()) else {
        return;
    };
    let Ok(Some(element)) = document.query_selector(anchor) else {
        return;
    };

    let options = ScrollIntoViewOptions::new();
    options.set_behavior(if prefers_reduced_motion() {
        ScrollBehavior::Auto
    } else {
        ScrollBehavior::Smooth
    });
    element.scroll_into_view_with_scroll_into_view_options(&options);
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Renders an ISO `YYYY-MM-DD…` date as e.g. "March 4, 2025". Falls back to
/// the raw value when the shape is unexpected.
fn format_publish_date(raw: &str) -> String {
    let mut parts = raw.split(['-', 'T']);
    let year = parts.next().unwrap_or_default();
    let month = parts
        .next()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|month| (1..=12).contains(month));
    let day = parts
        .next()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|day| (1..=31).contains(day));

    match (month, day) {
        (Some(month), Some(day)) if year.len() == 4 => {
            format!("{} {day}, {year}", MONTH_NAMES[month - 1])
        }
        _ => raw.to_string(),
    }
}

fn reading_time_minutes(excerpt: Option<&str>) -> usize {
    let words = excerpt
        .map(|text| text.split_whitespace().count())
        .unwrap_or(0);
    words.div_ceil(READING_WORDS_PER_MINUTE).max(1)
}

#[function_component(Navigation)]
fn navigation() -> Html {
    let is_open = use_state(|| false);
    let is_scrolled = use_state(|| false);

    {
        let is_scrolled = is_scrolled.clone();
        use_effect_with((), move |_| {
            let listener = window().map(|win| {
                let inner = win.clone();
                EventListener::new(&win, "scroll", move |_event| {
                    let scrolled = inner.scroll_y().unwrap_or(0.0) > NAV_SCROLLED_THRESHOLD_PX;
                    is_scrolled.set(scrolled);
                })
            });
            move || drop(listener)
        });
    }

    let nav_items = [
        ("Home", "#home"),
        ("Services", "#services"),
        ("About", "#about"),
        ("Projects", "#projects"),
        ("Blog", "#blog"),
        ("Contact", "#contact"),
    ];

    let on_toggle = {
        let is_open = is_open.clone();
        Callback::from(move |_: MouseEvent| is_open.set(!*is_open))
    };

    html! {
        <nav class={classes!("site-nav", is_scrolled.then_some("is-scrolled"))}>
            <div class="nav-inner">
                <span class="nav-brand">{"Layo.Dev"}</span>

                <ul class={classes!("nav-links", is_open.then_some("is-open"))}>
                    { for nav_items.iter().map(|(label, anchor)| {
                        let anchor = *anchor;
                        let is_open = is_open.clone();
                        let onclick = Callback::from(move |_: MouseEvent| {
                            scroll_to_section(anchor);
                            is_open.set(false);
                        });
                        html! {
                            <li><button type="button" class="nav-link" {onclick}>{label}</button></li>
                        }
                    }) }
                </ul>

                <button
                    type="button"
                    class="nav-menu-toggle"
                    aria-label="Toggle navigation menu"
                    aria-expanded={is_open.to_string()}
                    onclick={on_toggle}
                >
                    <span aria-hidden="true">{if *is_open { "✕" } else { "☰" }}</span>
                </button>
            </div>
        </nav>
    }
}

#[function_component(Hero)]
fn hero() -> Html {
    let portrait = use_lazy_image(
        LazyImageConfig::new(AttrValue::Static(HERO_IMAGE))
            .with_placeholder(AttrValue::Static(HERO_IMAGE_PLACEHOLDER)),
    );

    let on_hire = Callback::from(|_: MouseEvent| scroll_to_section("#contact"));
    let on_resume = Callback::from(|_: MouseEvent| {
        if let Some(win) = window() {
            let _ = win.open_with_url_and_target("/resume.pdf", "_blank");
        }
    });

    html! {
        <section id="home" class="hero">
            <Squares speed={0.5} square_size={40.0} />
            <div class="hero-inner">
                <div class="hero-copy">
                    <h1>
                        {"Hi, I'm "}
                        <span class="accent">{"Onah Benedict"}</span>
                    </h1>
                    <h2>{"Full Stack Developer"}</h2>
                    <p>
                        {"I craft seamless digital experiences: fast single-page sites, \
                          dependable APIs, and interfaces people enjoy using."}
                    </p>
                    <div class="hero-actions">
                        <button type="button" class="button button-primary" onclick={on_hire}>
                            {"Hire Me"}
                        </button>
                        <button type="button" class="button button-outline" onclick={on_resume}>
                            {"Download CV"}
                        </button>
                    </div>
                </div>
                <div class="hero-portrait">
                    <img
                        ref={portrait.node.clone()}
                        class={classes!("lazy-image", portrait.is_loaded.then_some("is-loaded"))}
                        src={portrait.src.clone()}
                        alt="Onah Benedict, full stack developer"
                        decoding="async"
                        onload={portrait.onload.clone()}
                        onerror={portrait.onerror.clone()}
                    />
                </div>
            </div>
        </section>
    }
}

#[function_component(Services)]
fn services() -> Html {
    let services = [
        (
            "◆",
            "Web Development",
            "Modern, responsive websites built with cutting-edge technologies and best practices.",
        ),
        (
            "◈",
            "UI/UX Design",
            "Beautiful, intuitive interfaces that provide exceptional user experiences.",
        ),
        (
            "▣",
            "Mobile Apps",
            "Cross-platform applications that work seamlessly on any device.",
        ),
        (
            "◉",
            "API Development",
            "Robust backend systems and APIs that power your applications efficiently.",
        ),
    ];

    html! {
        <section id="services" class="section-block">
            <header class="section-heading">
                <h2>{"My Services"}</h2>
                <p>{"A comprehensive range of services to bring your digital vision to life."}</p>
            </header>
            <div class="card-grid card-grid-4">
                { for services.iter().map(|(glyph, title, description)| html! {
                    <article class="card service-card">
                        <span class="service-glyph" aria-hidden="true">{glyph}</span>
                        <h3>{title}</h3>
                        <p>{description}</p>
                    </article>
                }) }
            </div>
        </section>
    }
}

#[function_component(About)]
fn about() -> Html {
    let stack = [
        "Rust",
        "TypeScript",
        "React",
        "PostgreSQL",
        "Tailwind",
        "Docker",
    ];

    html! {
        <section id="about" class="section-block">
            <header class="section-heading">
                <h2>{"About Me"}</h2>
            </header>
            <div class="about-layout">
                <p>
                    {"I'm a full-stack developer focused on shipping dependable software: \
                      clear interfaces on the front, boring reliability on the back. I like \
                      small systems that do one thing well and pages that stay fast on slow \
                      connections."}
                </p>
                <ul class="badge-list" aria-label="Technology stack">
                    { for stack.iter().map(|tech| html! { <li class="badge">{tech}</li> }) }
                </ul>
            </div>
        </section>
    }
}

#[derive(Properties, PartialEq)]
struct LazyCardImageProps {
    src: AttrValue,
    alt: AttrValue,
    should_pause: bool,
}

#[function_component(LazyCardImage)]
fn lazy_card_image(props: &LazyCardImageProps) -> Html {
    let image = use_lazy_image(
        LazyImageConfig::new(props.src.clone()).paused_while(props.should_pause),
    );

    html! {
        <img
            ref={image.node.clone()}
            class={classes!("lazy-image", image.is_loaded.then_some("is-loaded"))}
            src={image.src.clone()}
            alt={props.alt.clone()}
            decoding="async"
            onload={image.onload.clone()}
            onerror={image.onerror.clone()}
        />
    }
}

#[derive(Properties, PartialEq)]
struct ProjectCardProps {
    project: Project,
    should_pause: bool,
    animate: bool,
    index: usize,
}

#[function_component(ProjectCard)]
fn project_card(props: &ProjectCardProps) -> Html {
    let entrance_class = (props.animate && !props.should_pause).then_some("animate-slide-up");
    let entrance_style =
        entrance_class.map(|_| format!("animation-delay: {}ms;", props.index * 100));

    html! {
        <article class={classes!("card", "project-card", entrance_class)} style={entrance_style}>
            <div class="project-media">
                if let Some(image_url) = props.project.image_url.clone() {
                    <LazyCardImage
                        src={AttrValue::from(image_url)}
                        alt={props.project.title.clone()}
                        should_pause={props.should_pause}
                    />
                } else {
                    <div class="project-media-fallback" aria-hidden="true">{"◧"}</div>
                }
            </div>
            <div class="card-body">
                <h3>{&props.project.title}</h3>
                <p>{&props.project.description}</p>
                <ul class="badge-list">
                    { for props.project.tech_stack.iter().map(|tech| html! {
                        <li class="badge">{tech}</li>
                    }) }
                </ul>
                <div class="project-links">
                    if let Some(live_url) = props.project.live_url.clone() {
                        <a class="link" href={live_url} target="_blank" rel="noopener noreferrer">
                            {"Live"}
                            <span class="external-mark" aria-hidden="true">{"↗"}</span>
                        </a>
                    }
                    if let Some(github_url) = props.project.github_url.clone() {
                        <a class="link" href={github_url} target="_blank" rel="noopener noreferrer">
                            {"Code"}
                            <span class="external-mark" aria-hidden="true">{"↗"}</span>
                        </a>
                    }
                </div>
            </div>
        </article>
    }
}

fn skeleton_grid(cards: usize) -> Html {
    html! {
        <div class="card-grid card-grid-3" aria-hidden="true">
            { for (0..cards).map(|_| html! {
                <div class="card skeleton-card">
                    <div class="skeleton skeleton-media" />
                    <div class="card-body">
                        <div class="skeleton skeleton-line wide" />
                        <div class="skeleton skeleton-line" />
                        <div class="skeleton skeleton-line narrow" />
                    </div>
                </div>
            }) }
        </div>
    }
}

#[function_component(Projects)]
fn projects() -> Html {
    let projects = use_collection::<Project>("/api/projects");
    let scroll = use_scroll_activity();
    let animate = !prefers_reduced_motion();

    html! {
        <section id="projects" class="section-block">
            <header class="section-heading">
                <h2>{"Featured Projects"}</h2>
                <p>{"A showcase of recent work: modern web development, thoughtful UX, and scalable solutions."}</p>
            </header>
            {
                match projects.as_ref() {
                    None => skeleton_grid(6),
                    Some(projects) if projects.is_empty() => html! {
                        <p class="empty-state">{"No projects yet. Check back soon!"}</p>
                    },
                    Some(projects) => html! {
                        <div class="card-grid card-grid-3">
                            { for projects.iter().enumerate().map(|(index, project)| html! {
                                <ProjectCard
                                    key={project.id.clone()}
                                    project={project.clone()}
                                    should_pause={scroll.should_pause}
                                    animate={animate}
                                    index={index}
                                />
                            }) }
                        </div>
                    },
                }
            }
        </section>
    }
}

#[function_component(Blog)]
fn blog() -> Html {
    let posts = use_collection::<BlogPost>("/api/posts");

    html! {
        <section id="blog" class="section-block">
            <header class="section-heading">
                <h2>{"From the Blog"}</h2>
                <p>{"Notes on building for the web."}</p>
            </header>
            {
                match posts.as_ref() {
                    None => skeleton_grid(3),
                    Some(posts) if posts.is_empty() => html! {
                        <p class="empty-state">{"No posts published yet."}</p>
                    },
                    Some(posts) => html! {
                        <div class="card-grid card-grid-3">
                            { for posts.iter().map(|post| {
                                let published = post
                                    .published_at
                                    .as_deref()
                                    .map(format_publish_date);
                                html! {
                                    <article class="card blog-card" key={post.id.clone()}>
                                        <div class="card-body">
                                            <h3>{&post.title}</h3>
                                            if let Some(excerpt) = post.excerpt.as_deref() {
                                                <p>{excerpt}</p>
                                            }
                                            <p class="card-meta">
                                                if let Some(published) = published {
                                                    <span>{published}</span>
                                                }
                                                <span>
                                                    {format!("{} min read", reading_time_minutes(post.excerpt.as_deref()))}
                                                </span>
                                                <span>{format!("by {}", post.author)}</span>
                                            </p>
                                            <ul class="badge-list">
                                                { for post.tags.iter().map(|tag| html! {
                                                    <li class="badge">{tag}</li>
                                                }) }
                                            </ul>
                                        </div>
                                    </article>
                                }
                            }) }
                        </div>
                    },
                }
            }
        </section>
    }
}

#[function_component(Testimonials)]
fn testimonials() -> Html {
    let testimonials = use_collection::<Testimonial>("/api/testimonials");
    let current = use_state(|| 0usize);
    let count = testimonials.as_ref().map(Vec::len).unwrap_or(0);

    // Auto-advance while more than one testimonial is visible. Keying on the
    // current index re-arms the interval after every advance, so manual
    // navigation also resets the timer; dropping the old interval cancels it.
    {
        let current = current.clone();
        use_effect_with((count, *current), move |(count, index)| {
            let (count, index) = (*count, *index);
            let interval = (count > 1).then(|| {
                Interval::new(TESTIMONIAL_ADVANCE_INTERVAL_MS, move || {
                    current.set((index + 1) % count);
                })
            });
            move || drop(interval)
        });
    }

    let on_previous = {
        let current = current.clone();
        Callback::from(move |_: MouseEvent| {
            if count > 0 {
                current.set((*current + count - 1) % count);
            }
        })
    };
    let on_next = {
        let current = current.clone();
        Callback::from(move |_: MouseEvent| {
            if count > 0 {
                current.set((*current + 1) % count);
            }
        })
    };

    html! {
        <section id="testimonials" class="section-block">
            <header class="section-heading">
                <h2>{"What Clients Say"}</h2>
            </header>
            {
                match testimonials.as_ref() {
                    None => html! { <div class="skeleton skeleton-quote" aria-hidden="true" /> },
                    Some(testimonials) if testimonials.is_empty() => html! {
                        <p class="empty-state">{"No testimonials yet."}</p>
                    },
                    Some(testimonials) => {
                        let index = (*current).min(testimonials.len() - 1);
                        let testimonial = &testimonials[index];
                        let attribution = [
                            testimonial.client_role.as_deref(),
                            testimonial.client_company.as_deref(),
                        ]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(", ");

                        html! {
                            <figure class="testimonial">
                                if let Some(rating) = testimonial.rating.filter(|rating| *rating > 0) {
                                    <p class="testimonial-rating" aria-label={format!("Rated {rating} out of 5")}>
                                        {"★".repeat(rating.min(5) as usize)}
                                    </p>
                                }
                                <blockquote>{&testimonial.testimonial_text}</blockquote>
                                <figcaption>
                                    <strong>{&testimonial.client_name}</strong>
                                    if !attribution.is_empty() {
                                        <span class="muted">{format!(" — {attribution}")}</span>
                                    }
                                </figcaption>
                                <div class="carousel-controls">
                                    <button type="button" aria-label="Previous testimonial" onclick={on_previous}>
                                        {"‹"}
                                    </button>
                                    <span class="muted">{format!("{} / {}", index + 1, testimonials.len())}</span>
                                    <button type="button" aria-label="Next testimonial" onclick={on_next}>
                                        {"›"}
                                    </button>
                                </div>
                            </figure>
                        }
                    }
                }
            }
        </section>
    }
}

#[derive(Clone, PartialEq, Default, Serialize)]
struct ContactForm {
    name: String,
    email: String,
    subject: String,
    message: String,
}

#[derive(Deserialize)]
struct ContactResponse {
    ok: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum SubmitStatus {
    Idle,
    Sending,
    Sent,
    Failed,
}

async fn submit_contact(form: &ContactForm) -> bool {
    let Ok(request) = Request::post("/api/contact").json(form) else {
        return false;
    };
    let Ok(response) = request.send().await else {
        return false;
    };

    response
        .json::<ContactResponse>()
        .await
        .map(|payload| payload.ok)
        .unwrap_or(false)
}

#[function_component(Contact)]
fn contact() -> Html {
    let form = use_state(ContactForm::default);
    let status = use_state(|| SubmitStatus::Idle);

    let on_input = |field: fn(&mut ContactForm, String)| {
        let form = form.clone();
        Callback::from(move |event: InputEvent| {
            let value = event
                .target_dyn_into::<HtmlInputElement>()
                .map(|input| input.value())
                .or_else(|| {
                    event
                        .target_dyn_into::<HtmlTextAreaElement>()
                        .map(|area| area.value())
                });

            if let Some(value) = value {
                let mut next = (*form).clone();
                field(&mut next, value);
                form.set(next);
            }
        })
    };

    let on_submit = {
        let form = form.clone();
        let status = status.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();

            if *status == SubmitStatus::Sending {
                return;
            }

            let payload = (*form).clone();
            let form = form.clone();
            let status = status.clone();
            status.set(SubmitStatus::Sending);

            wasm_bindgen_futures::spawn_local(async move {
                if submit_contact(&payload).await {
                    status.set(SubmitStatus::Sent);
                    form.set(ContactForm::default());
                } else {
                    status.set(SubmitStatus::Failed);
                }
            });
        })
    };

    let status_line = match *status {
        SubmitStatus::Idle => None,
        SubmitStatus::Sending => Some(("sending", "Sending your message…")),
        SubmitStatus::Sent => Some(("sent", "Message sent! I'll get back to you soon.")),
        SubmitStatus::Failed => Some((
            "failed",
            "There was a problem sending your message. Please try again.",
        )),
    };

    html! {
        <section id="contact" class="section-block">
            <header class="section-heading">
                <h2>{"Get In Touch"}</h2>
                <p>{"Have a project in mind? Let's talk about bringing it to life."}</p>
            </header>
            <form class="contact-form" onsubmit={on_submit}>
                <label>
                    {"Name"}
                    <input
                        name="name"
                        required={true}
                        value={form.name.clone()}
                        oninput={on_input(|form, value| form.name = value)}
                    />
                </label>
                <label>
                    {"Email"}
                    <input
                        name="email"
                        type="email"
                        required={true}
                        value={form.email.clone()}
                        oninput={on_input(|form, value| form.email = value)}
                    />
                </label>
                <label>
                    {"Subject"}
                    <input
                        name="subject"
                        value={form.subject.clone()}
                        oninput={on_input(|form, value| form.subject = value)}
                    />
                </label>
                <label>
                    {"Message"}
                    <textarea
                        name="message"
                        required={true}
                        rows="6"
                        value={form.message.clone()}
                        oninput={on_input(|form, value| form.message = value)}
                    />
                </label>
                <button
                    type="submit"
                    class="button button-primary"
                    disabled={*status == SubmitStatus::Sending}
                >
                    {"Send Message"}
                </button>
                if let Some((class, text)) = status_line {
                    <p class={classes!("form-status", class)} role="status">{text}</p>
                }
            </form>
        </section>
    }
}

#[function_component(Footer)]
fn footer() -> Html {
    html! {
        <footer class="site-footer">
            <p class="muted">{"© Layo.Dev. Built with Rust and Yew."}</p>
        </footer>
    }
}

#[function_component(App)]
fn app() -> Html {
    html! {
        <>
            <a class="skip-link" href="#home">{"Skip to main content"}</a>
            <Navigation />
            <main>
                <Hero />
                <Services />
                <About />
                <Projects />
                <Blog />
                <Testimonials />
                <Contact />
            </main>
            <Footer />
        </>
    }
}

pub fn run() {
    yew::Renderer::<App>::with_root(
        window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("app"))
            .expect("missing #app mount point"),
    )
    .render();
}
