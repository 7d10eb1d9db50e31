use std::sync::Arc;

use plinth::prelude::*;

fn main() {
    let app = bootstrap();

    let registry = app.get_as::<ProjectRegistry>("registry").unwrap().unwrap();
    registry.show();

    // The same application is reachable statically once booted.
    let current = App::current().unwrap();
    let version = current.get_as::<String>("version").unwrap().unwrap();
    println!("powered by plinth {version}");
}

fn bootstrap() -> Application {
    if plinth::booted() {
        return plinth::app().unwrap();
    }

    let app = Application::new();
    app.provider(PortfolioProvider);
    app.boot();
    app
}

struct PortfolioProvider;

impl ServiceProvider for PortfolioProvider {
    fn register(&self, app: &Container) {
        app.instance("site.name", String::from("Portfolio"));

        app.define(
            "registry",
            Blueprint::new(|_, args| {
                let site = args[0].clone().downcast::<String>().unwrap();
                Ok(value(ProjectRegistry::new((*site).clone())))
            })
            .param(ParamSpec::new("site").resolves("site.name")),
        );
        app.singleton("registry", None);
    }

    fn boot(&self, app: &Container) {
        app.extend("registry", |object, _| {
            let registry: Arc<ProjectRegistry> = object.downcast().unwrap();
            value(registry.with_project("plinth"))
        });
    }
}

struct ProjectRegistry {
    site: String,
    projects: Vec<String>,
}

impl ProjectRegistry {
    fn new(site: String) -> Self {
        Self {
            site,
            projects: Vec::new(),
        }
    }

    fn with_project(&self, name: &str) -> Self {
        let mut projects = self.projects.clone();
        projects.push(name.to_owned());
        Self {
            site: self.site.clone(),
            projects,
        }
    }

    fn show(&self) {
        println!("{}:", self.site);
        for project in &self.projects {
            println!("  - {project}");
        }
    }
}
