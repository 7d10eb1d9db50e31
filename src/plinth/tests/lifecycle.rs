use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serial_test::serial;

use plinth::prelude::*;

struct CountingProvider {
    registered: Arc<AtomicUsize>,
    booted: Arc<AtomicUsize>,
}

impl ServiceProvider for CountingProvider {
    fn register(&self, app: &Container) {
        self.registered.fetch_add(1, Ordering::SeqCst);
        app.singleton(
            "counter",
            Some(Producer::factory(|_, _| Ok(value(AtomicUsize::new(0))))),
        );
    }

    fn boot(&self, app: &Container) {
        self.booted.fetch_add(1, Ordering::SeqCst);
        let counter = app.get_as::<AtomicUsize>("counter").unwrap().unwrap();
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

struct DecoratingProvider;

impl ServiceProvider for DecoratingProvider {
    fn register(&self, app: &Container) {
        app.instance("site.name", String::from("Portfolio"));
        app.extend("site.name", |object, _| {
            let name: Arc<String> = object.downcast().unwrap();
            value(format!("{name} (decorated)"))
        });
    }
}

#[test]
#[serial]
fn providers_register_at_add_time_and_boot_once() {
    let registered = Arc::new(AtomicUsize::new(0));
    let booted = Arc::new(AtomicUsize::new(0));

    let app = Application::new();
    app.provider(CountingProvider {
        registered: Arc::clone(&registered),
        booted: Arc::clone(&booted),
    });

    // register ran the moment the provider was added.
    assert_eq!(registered.load(Ordering::SeqCst), 1);
    assert_eq!(booted.load(Ordering::SeqCst), 0);
    assert!(app.bound("counter"));
    assert!(!app.is_booted());

    app.boot();
    app.boot();

    assert_eq!(registered.load(Ordering::SeqCst), 1);
    assert_eq!(booted.load(Ordering::SeqCst), 1);
    assert!(app.is_booted());
    assert!(plinth::booted());

    let counter = app.get_as::<AtomicUsize>("counter").unwrap().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn booted_application_is_reachable_through_the_proxy() {
    let app = Application::new();
    app.provider(DecoratingProvider);
    app.boot();

    let current = plinth::app().unwrap();
    assert!(current.is_booted());

    // Instance bindings bypass extensions.
    let name = App::get("site.name").unwrap().unwrap();
    assert_eq!(*name.downcast::<String>().unwrap(), "Portfolio");

    // Rebinding swaps the instance for a decorated shared binding. Literal
    // producers skip extensions, so the rebind uses a factory.
    current.bind(
        "site.name",
        Some(Producer::factory(|_, _| Ok(value(String::from("Portfolio"))))),
        true,
    );
    current.extend("site.name", |object, _| {
        let name: Arc<String> = object.downcast().unwrap();
        value(format!("{name} (decorated)"))
    });

    let name = App::get("site.name").unwrap().unwrap();
    assert_eq!(*name.downcast::<String>().unwrap(), "Portfolio (decorated)");
}

#[test]
#[serial]
fn aliases_and_blueprints_work_through_the_application() {
    let app = Application::new();

    app.define(
        "greeting",
        Blueprint::new(|_, args| {
            let audience = args[0].clone().downcast::<String>().unwrap();
            Ok(value(format!("hello {audience}")))
        })
        .param(ParamSpec::new("audience").fallback(String::from("world"))),
    );
    app.singleton("greeting", None);
    app.alias("greeting", "hi");

    let through_alias = app.get_as::<String>("hi").unwrap().unwrap();
    assert_eq!(*through_alias, "hello world");

    let supplied = app
        .resolve_as::<String>(
            "greeting",
            &Parameters::new().with("audience", String::from("you")),
        )
        .unwrap()
        .unwrap();
    // The shared instance was cached by the alias resolution first.
    assert_eq!(*supplied, "hello world");

    app.remove("greeting");
    assert!(!app.bound("greeting"));
}
