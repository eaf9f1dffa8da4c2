//! Glue between loaded pages and the navigators they host.
//!
//! After every page load the host looks for known mount ids in the markup.
//! Each mount found gets a fresh navigator over its catalog, registered on the
//! jump bus under the mount id. Mounts that disappeared with the previous page
//! are dropped, so jumps aimed at them come back `Unregistered`. A failed load
//! replaces the page with an error block, which unmounts everything.

use crate::builtin;
use crate::catalog::{CatalogRepository, SchemaError};
use crate::jump::{JumpBus, JumpOutcome, MountId};
use crate::navigator::Navigator;
use crate::pages::{FragmentSource, LoadedSection, PageLoader};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type SharedNavigator = Rc<RefCell<Navigator>>;

pub struct GuideHost {
    repository: CatalogRepository,
    mounts: Vec<(MountId, String)>,
    source: Box<dyn FragmentSource>,
    pages: PageLoader,
    bus: JumpBus,
    mounted: BTreeMap<MountId, SharedNavigator>,
}

impl GuideHost {
    /// Host over an explicit repository and mount table.
    pub fn new<S>(repository: CatalogRepository, mounts: &[(&str, &str)], source: S) -> Self
    where
        S: FragmentSource + 'static,
    {
        Self {
            repository,
            mounts: mounts
                .iter()
                .map(|(mount, key)| (MountId::from(*mount), key.to_string()))
                .collect(),
            source: Box::new(source),
            pages: PageLoader::new(),
            bus: JumpBus::new(),
            mounted: BTreeMap::new(),
        }
    }

    /// Host over the builtin catalogs and mount table.
    pub fn with_builtin<S>(source: S) -> Result<Self, SchemaError>
    where
        S: FragmentSource + 'static,
    {
        Ok(Self::new(builtin::repository()?, builtin::MOUNTS, source))
    }

    pub fn repository(&self) -> &CatalogRepository {
        &self.repository
    }

    pub fn pages(&self) -> &PageLoader {
        &self.pages
    }

    pub fn load_section(&mut self, name: &str, anchor: Option<&str>) -> LoadedSection {
        let loaded = self.pages.load_section(self.source.as_ref(), name, anchor);
        self.mount_from_markup(&loaded.html);
        loaded
    }

    pub fn go_back(&mut self) -> Option<LoadedSection> {
        let loaded = self.pages.go_back(self.source.as_ref())?;
        self.mount_from_markup(&loaded.html);
        Some(loaded)
    }

    /// Replace the mounted navigators with one per known mount in `html`.
    /// Returns the mounts now live, in mount-table order.
    pub fn mount_from_markup(&mut self, html: &str) -> Vec<MountId> {
        for stale in std::mem::take(&mut self.mounted).into_keys() {
            self.bus.unregister(&stale);
        }

        let mut live = Vec::new();
        for (mount, key) in &self.mounts {
            if !markup_has_id(html, &mount.0) {
                continue;
            }
            let Some(navigator) = self.repository.navigator(key) else {
                log::warn!("mount '{mount}' names unknown catalog '{key}'");
                continue;
            };
            let shared = Rc::new(RefCell::new(navigator));
            self.bus.register(mount.clone(), Rc::clone(&shared));
            self.mounted.insert(mount.clone(), shared);
            log::debug!("mounted '{key}' at '{mount}'");
            live.push(mount.clone());
        }
        live
    }

    pub fn navigator(&self, mount: &str) -> Option<SharedNavigator> {
        self.mounted.get(&MountId::from(mount)).map(Rc::clone)
    }

    pub fn mounted(&self) -> impl Iterator<Item = &MountId> {
        self.mounted.keys()
    }

    /// Dispatch an encoded `<key>:<index>` jump to a mount.
    pub fn jump(&mut self, mount: &str, encoded: &str) -> JumpOutcome {
        self.bus.dispatch_encoded(&MountId::from(mount), encoded)
    }
}

/// True when `html` has an element whose `id` attribute is exactly `id`.
pub fn markup_has_id(html: &str, id: &str) -> bool {
    html.contains(&format!("id=\"{id}\"")) || html.contains(&format!("id='{id}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments() -> BTreeMap<String, String> {
        let mut pages = BTreeMap::new();
        pages.insert(
            "study_participation_procedures.html".to_string(),
            "<h1>Section 5</h1><div id=\"spp-wizard-root\"></div>".to_string(),
        );
        pages.insert(
            "faq.html".to_string(),
            "<h1>FAQ</h1><div id='ts-root'></div>".to_string(),
        );
        pages
    }

    #[test]
    fn markup_id_match_is_exact() {
        assert!(markup_has_id("<div id=\"ts-root\">", "ts-root"));
        assert!(!markup_has_id("<div id=\"ts-root-old\">", "ts-root"));
        assert!(!markup_has_id("<div class=\"ts-root\">", "ts-root"));
    }

    #[test]
    fn jumps_follow_the_current_page() {
        let mut host = GuideHost::with_builtin(fragments()).unwrap();
        assert_eq!(host.jump("spp-wizard-root", "finish:2"), JumpOutcome::Unregistered);

        assert!(host.load_section("study_participation_procedures.html", None).ok);
        assert_eq!(host.jump("spp-wizard-root", "finish:2"), JumpOutcome::Applied);
        let nav = host.navigator("spp-wizard-root").unwrap();
        assert_eq!(nav.borrow().state().section_index(), Some(2));
        assert_eq!(nav.borrow().state().step_index(), Some(2));

        host.load_section("faq.html", None);
        assert_eq!(host.mounted().collect::<Vec<_>>(), [&MountId::from("ts-root")]);
        assert_eq!(host.jump("spp-wizard-root", "finish:2"), JumpOutcome::Unregistered);
    }

    #[test]
    fn jump_while_navigator_is_borrowed_is_rejected() {
        let mut host = GuideHost::with_builtin(fragments()).unwrap();
        host.load_section("study_participation_procedures.html", None);
        let nav = host.navigator("spp-wizard-root").unwrap();
        let view = nav.borrow();
        assert_eq!(
            host.jump("spp-wizard-root", "finish:2"),
            JumpOutcome::Rejected(crate::navigator::NavError::Busy)
        );
        drop(view);
        assert_eq!(host.jump("spp-wizard-root", "finish:2"), JumpOutcome::Applied);
    }

    #[test]
    fn reload_recreates_navigators_at_start() {
        let mut host = GuideHost::with_builtin(fragments()).unwrap();
        host.load_section("study_participation_procedures.html", None);
        host.jump("spp-wizard-root", "app:3");
        host.load_section("faq.html", None);
        host.go_back().unwrap();
        let nav = host.navigator("spp-wizard-root").unwrap();
        assert_eq!(nav.borrow().state().section_index(), Some(0));
        assert_eq!(nav.borrow().state().step_index(), Some(0));
    }

    #[test]
    fn failed_load_unmounts_the_previous_page() {
        let mut host = GuideHost::with_builtin(fragments()).unwrap();
        host.load_section("faq.html", None);
        assert!(host.navigator("ts-root").is_some());
        let loaded = host.load_section("missing.html", None);
        assert!(!loaded.ok);
        assert!(host.navigator("ts-root").is_none());
        assert_eq!(host.pages().history(), ["faq.html"]);
    }
}
