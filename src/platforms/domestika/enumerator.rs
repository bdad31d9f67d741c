use domestika_core::models::course::{CourseListing, UnitEntry};

use super::parser::{self, COURSE_TITLE_SELECTOR, SECTION_SELECTOR, UNIT_LINK_SELECTOR};
use crate::platforms::traits::PageDriver;

pub struct CourseEnumerator<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> CourseEnumerator<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    /// Walks the course page and then every unit page, one at a time.
    pub async fn enumerate(&self, course_url: &str) -> anyhow::Result<CourseListing> {
        let page = self.driver.navigate(course_url).await?;
        tracing::info!("Scraping site");

        let title = parser::extract_text(&page.html, COURSE_TITLE_SELECTOR)?;
        let links = parser::extract_links(&page.html, UNIT_LINK_SELECTOR)?;

        let final_project = parser::find_final_project(&links);
        let units = parser::without_final_project(links);
        tracing::info!("{} units detected", units.len());

        let mut entries = Vec::with_capacity(units.len());
        let mut total = 0usize;

        for unit in units {
            let url = parser::resolve_href(course_url, &unit.href);
            let unit_page = self.driver.navigate(&url).await?;
            let section = parser::extract_text(&unit_page.html, SECTION_SELECTOR)?;
            let videos = parser::videos_from_init_data(unit_page.init_data.as_ref(), &section);

            total += videos.len();
            tracing::debug!("[domestika] unit '{}': {} videos ({} so far)", unit.text, videos.len(), total);

            entries.push(UnitEntry {
                title: unit.text,
                videos,
            });
        }

        tracing::info!("All videos found ({})", total);

        Ok(CourseListing {
            title,
            units: entries,
            final_project,
        })
    }
}
