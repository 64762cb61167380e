// Dashboard state and the interaction entry points

use crate::charts::{ChartBindings, RenderSurface};
use crate::filter::DimensionKey;
use crate::index::{CrossFilter, Dimension};
use crate::pager::YearPager;
use crate::range::{DateRange, RangeError};
use crate::record::normalize;
use crate::source::DataSource;
use crate::words::{self, WeightedWord};
use eyre::{Result, eyre};
use tracing::{info, warn};

/// Year label shown after a failed load
pub const LOAD_ERROR_LABEL: &str = "Error cargando datos";

const NOT_LOADED_MESSAGE: &str = "No hay datos para mostrar. Aplica un filtro primero.";
const NO_WORDS_MESSAGE: &str =
    "No se encontraron palabras válidas en los criterios de búsqueda para el rango seleccionado.";

/// Outcome of the most recent load
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    Loaded { records: usize },
    /// The source answered, but no row had a usable date
    Empty,
    /// The source call failed
    Failed(String),
}

/// Everything one load owns. Replaced wholesale by the next load.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub index: Option<CrossFilter>,
    pub pager: YearPager,
    pub status: LoadStatus,
    pub range: DateRange,
}

impl DashboardState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether there are records to filter and extract words from
    pub fn is_ready(&self) -> bool {
        self.index.as_ref().is_some_and(|i| !i.is_empty())
    }
}

/// Result of opening the word cloud
#[derive(Debug, Clone, PartialEq)]
pub enum WordCloud {
    NotLoaded,
    NoWords,
    Words(Vec<WeightedWord>),
}

impl WordCloud {
    /// Message to show instead of a cloud, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            WordCloud::NotLoaded => Some(NOT_LOADED_MESSAGE),
            WordCloud::NoWords => Some(NO_WORDS_MESSAGE),
            WordCloud::Words(_) => None,
        }
    }
}

/// Owns the dashboard state and routes every interaction through one redraw path.
///
/// Loads run one at a time; whichever load completes last defines the state.
pub struct Controller<S, R> {
    source: S,
    surface: R,
    state: DashboardState,
}

impl<S: DataSource, R: RenderSurface> Controller<S, R> {
    pub fn new(source: S, surface: R) -> Self {
        Self {
            source,
            surface,
            state: DashboardState::default(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn into_surface(self) -> R {
        self.surface
    }

    /// Validate the filter form, then load. Invalid input never reaches the source.
    pub fn apply_filters(&mut self, start: &str, end: &str) -> Result<&LoadStatus, RangeError> {
        let range = DateRange::from_inputs(start, end).inspect_err(|e| {
            warn!(start, end, error = %e, "Rejected filter input");
        })?;
        Ok(self.load(range))
    }

    /// Fetch, normalize and rebuild index and pager from scratch, then redraw
    pub fn load(&mut self, range: DateRange) -> &LoadStatus {
        info!(range = %range, "Loading dashboard data");

        let fetched = self.source.fetch(&range);
        self.state.reset();
        self.state.range = range;

        match fetched {
            Ok(rows) => {
                let records = normalize(&rows);
                self.state.pager = YearPager::init(&records);
                let index = CrossFilter::build(records);

                self.state.status = if index.is_empty() {
                    LoadStatus::Empty
                } else {
                    LoadStatus::Loaded { records: index.len() }
                };
                info!(
                    rows = rows.len(),
                    records = index.len(),
                    years = ?self.state.pager.available_years(),
                    "Data loaded"
                );
                self.state.index = Some(index);
            }
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(error = %message, "Failed to load data");
                self.state.status = LoadStatus::Failed(message);
            }
        }

        self.on_filter_changed();
        &self.state.status
    }

    /// Single redraw entry point: recompute every group, draw every chart, refresh year controls
    pub fn on_filter_changed(&mut self) {
        match &self.state.index {
            Some(index) => ChartBindings::redraw_all(index, &self.state.pager, &mut self.surface),
            None => ChartBindings::clear_all(&mut self.surface),
        }

        let label = match self.state.status {
            LoadStatus::Failed(_) => LOAD_ERROR_LABEL.to_string(),
            _ => self.state.pager.label(),
        };
        self.surface.set_year_label(&label);
        self.surface
            .set_year_nav(self.state.pager.has_prev(), self.state.pager.has_next());
    }

    fn index_mut(&mut self) -> Result<&mut CrossFilter> {
        self.state.index.as_mut().ok_or_else(|| eyre!("No data loaded"))
    }

    /// Brush a contiguous key range `[lo, hi)` on one chart
    pub fn brush(&mut self, dim: Dimension, lo: DimensionKey, hi: DimensionKey) -> Result<()> {
        self.index_mut()?.filter_range(dim, lo, hi)?;
        self.on_filter_changed();
        Ok(())
    }

    /// Click a single bar, row or slice
    pub fn select(&mut self, dim: Dimension, key: DimensionKey) -> Result<()> {
        self.index_mut()?.filter_exact(dim, key)?;
        self.on_filter_changed();
        Ok(())
    }

    pub fn select_many(&mut self, dim: Dimension, keys: Vec<DimensionKey>) -> Result<()> {
        self.index_mut()?.filter_in(dim, keys)?;
        self.on_filter_changed();
        Ok(())
    }

    pub fn clear_filter(&mut self, dim: Dimension) {
        if let Some(index) = self.state.index.as_mut() {
            index.filter_all(dim);
        }
        self.on_filter_changed();
    }

    pub fn clear_all_filters(&mut self) {
        if let Some(index) = self.state.index.as_mut() {
            index.clear_all();
        }
        self.on_filter_changed();
    }

    pub fn next_year(&mut self) -> bool {
        self.change_year(YearPager::next)
    }

    pub fn prev_year(&mut self) -> bool {
        self.change_year(YearPager::prev)
    }

    pub fn select_year(&mut self, year: i32) -> bool {
        self.change_year(|pager| pager.select(year))
    }

    // A leftover month brush would hide bars of the newly shown year
    fn change_year<F: FnOnce(&mut YearPager) -> bool>(&mut self, step: F) -> bool {
        if !step(&mut self.state.pager) {
            return false;
        }
        if let Some(index) = self.state.index.as_mut() {
            index.filter_all(Dimension::Month);
        }
        info!(year = ?self.state.pager.current_year(), "Year changed");
        self.on_filter_changed();
        true
    }

    /// Word counts over the currently filtered records, heaviest first
    pub fn word_cloud(&self, limit: usize) -> WordCloud {
        let index = match &self.state.index {
            Some(index) if self.state.is_ready() => index,
            _ => return WordCloud::NotLoaded,
        };

        let counts = words::extract(index.all_filtered());
        if counts.is_empty() {
            WordCloud::NoWords
        } else {
            WordCloud::Words(words::cloud_list(&counts, limit))
        }
    }
}
