//! The injected page-side shim.
//!
//! The companion app exposes its service layer through observer objects on
//! `window.services`. The shim wraps those observers with promise-returning
//! methods under `window.CompanionShim`, grouped by namespace, so the bridge
//! can drive them through `Runtime.evaluate`. The script is fully
//! self-contained and idempotent: re-injecting over a live shim is a no-op.

/// Promise timeout applied to every wrapped observer, in milliseconds.
pub const OBSERVE_TIMEOUT_MS: u64 = 30_000;

pub const COMPANION_SHIM_JS: &str = r#"
(function() {
  'use strict';

  if (window.CompanionShim && window.CompanionShim._initialized) {
    return window.CompanionShim;
  }

  function ShimServiceError(code, message, detail) {
    this.name = 'ShimServiceError';
    this.code = code;
    this.message = message;
    this.detail = detail;
  }
  ShimServiceError.prototype = Object.create(Error.prototype);
  ShimServiceError.prototype.constructor = ShimServiceError;

  // One-shot observe() -> Promise. The timer is cancelled on any outcome so
  // a settled call never fires a late rejection.
  function observeToPromise(observable, timeout) {
    timeout = timeout || 30000;

    return new Promise(function(resolve, reject) {
      if (!observable || typeof observable.observe !== 'function') {
        reject(new ShimServiceError('INVALID_OBSERVABLE', 'Invalid observable object'));
        return;
      }

      var timeoutId = setTimeout(function() {
        reject(new ShimServiceError('TIMEOUT', 'Request timed out after ' + timeout + 'ms'));
      }, timeout);

      try {
        observable.observe(this, function onComplete(sender, response) {
          clearTimeout(timeoutId);

          if (response && response.success === false) {
            reject(new ShimServiceError(
              response.status || (response.error && response.error.code) || 'ERROR',
              (response.error && response.error.message) || 'Request failed',
              response
            ));
            return;
          }

          if (response && response.data !== undefined) {
            resolve(response.data);
          } else if (response && response.response !== undefined) {
            resolve(response.response);
          } else {
            resolve(response);
          }
        });
      } catch (e) {
        clearTimeout(timeoutId);
        reject(new ShimServiceError('OBSERVE_ERROR', e.message || 'Failed to observe', e));
      }
    });
  }

  function getServices() {
    if (typeof window === 'undefined') {
      throw new ShimServiceError('NO_WINDOW', 'Window object not available');
    }
    if (!window.services) {
      throw new ShimServiceError('NO_SERVICES', 'Page services object not available. Make sure you are logged in.');
    }
    return window.services;
  }

  var ItemPile = {
    CLUB: 'club',
    TRANSFER: window.ItemPile ? window.ItemPile.TRANSFER : 2,
    WATCHLIST: window.ItemPile ? window.ItemPile.WATCHLIST : 4,
    UNASSIGNED: window.ItemPile ? window.ItemPile.UNASSIGNED : 5,
    SBC_STORAGE: 'sbcStorage'
  };

  window.CompanionShim = {
    _initialized: true,
    _version: '1.0.0',

    sbc: {
      requestSets: function() {
        return observeToPromise(getServices().SBC.requestSets());
      },
      requestChallengesForSet: function(set) {
        return observeToPromise(getServices().SBC.requestChallengesForSet(set));
      },
      loadChallenge: function(challenge) {
        return observeToPromise(getServices().SBC.loadChallenge(challenge));
      },
      saveChallenge: function(challenge) {
        return observeToPromise(getServices().SBC.saveChallenge(challenge));
      },
      submitChallenge: function(challenge, set) {
        return observeToPromise(getServices().SBC.submitChallenge(challenge, set, true, true));
      },
      getCachedSquads: function() {
        try {
          return getServices().SBC.getCachedSBCSquads() || [];
        } catch (e) {
          return [];
        }
      },
      resetCache: function() {
        try {
          if (getServices().SBC.repository && getServices().SBC.repository.reset) {
            getServices().SBC.repository.reset();
          }
          return true;
        } catch (e) {
          return false;
        }
      }
    },

    item: {
      searchTransferMarket: function(criteria, page) {
        getServices().Item.clearTransferMarketCache();
        return observeToPromise(getServices().Item.searchTransferMarket(criteria, page || 0));
      },
      bid: function(item, price) {
        return observeToPromise(getServices().Item.bid(item, price));
      },
      list: function(item, startingBid, buyNowPrice, duration) {
        return observeToPromise(getServices().Item.list(item, startingBid, buyNowPrice, duration));
      },
      move: function(items, pile) {
        var itemArray = Array.isArray(items) ? items : [items];
        return observeToPromise(getServices().Item.move(itemArray, pile));
      },
      requestTransferItems: function() {
        return observeToPromise(getServices().Item.requestTransferItems());
      },
      requestWatchedItems: function() {
        return observeToPromise(getServices().Item.requestWatchedItems());
      },
      refreshAuctions: function(items) {
        return observeToPromise(getServices().Item.refreshAuctions(items));
      },
      relistExpiredAuctions: function() {
        return observeToPromise(getServices().Item.relistExpiredAuctions());
      },
      untarget: function(items) {
        try {
          getServices().Item.untarget(items);
          return Promise.resolve({ success: true });
        } catch (e) {
          return Promise.reject(new ShimServiceError('UNTARGET_ERROR', e.message));
        }
      },
      requestMarketData: function(item) {
        return observeToPromise(getServices().Item.requestMarketData(item));
      },
      requestUnassignedItems: function() {
        return observeToPromise(getServices().Item.requestUnassignedItems());
      },
      searchStorageItems: function(criteria) {
        return observeToPromise(getServices().Item.searchStorageItems(criteria));
      },
      discard: function(items) {
        var itemArray = Array.isArray(items) ? items : [items];
        return observeToPromise(getServices().Item.discard(itemArray));
      }
    },

    club: {
      search: function(criteria) {
        return observeToPromise(getServices().Club.search(criteria));
      },
      getStats: function() {
        return observeToPromise(getServices().Club.getStats());
      }
    },

    user: {
      getUser: function() {
        try {
          var user = getServices().User.getUser();
          if (!user) return null;

          var persona = user.getSelectedPersona ? user.getSelectedPersona() : null;
          return {
            personaId: user.personaId,
            personaName: user.personaName,
            coins: user.coins ? user.coins.amount : 0,
            points: user.points ? user.points.amount : 0,
            clubName: persona ? persona.clubName : null,
            clubAbbr: persona ? persona.clubAbbr : null,
            established: persona ? persona.established : null,
            platform: persona ? (persona.isPC ? 'pc' : 'console') : null
          };
        } catch (e) {
          return null;
        }
      },
      requestCurrencies: function() {
        return observeToPromise(getServices().User.requestCurrencies());
      }
    },

    store: {
      getPacks: function(type) {
        return observeToPromise(getServices().Store.getPacks(type, false, false));
      }
    },

    notification: {
      queue: function(message, type) {
        try {
          var notificationType = type || 'neutral';
          var typeValue = window.UINotificationType ?
            window.UINotificationType[notificationType.toUpperCase()] : notificationType;
          getServices().Notification.queue([message, typeValue]);
          return true;
        } catch (e) {
          return false;
        }
      }
    },

    localization: {
      localize: function(key) {
        try {
          return getServices().Localization.localize(key);
        } catch (e) {
          return key;
        }
      },
      getLocale: function() {
        try {
          return getServices().Localization.locale ?
            getServices().Localization.locale.language : null;
        } catch (e) {
          return null;
        }
      }
    },

    util: {
      isAvailable: function() {
        try {
          return typeof window !== 'undefined' &&
                 window.services !== undefined &&
                 window.services.SBC !== undefined;
        } catch (e) {
          return false;
        }
      },
      getAvailableServices: function() {
        try {
          var services = getServices();
          return {
            SBC: !!services.SBC,
            Item: !!services.Item,
            Club: !!services.Club,
            User: !!services.User,
            Store: !!services.Store,
            Notification: !!services.Notification,
            Localization: !!services.Localization
          };
        } catch (e) {
          return null;
        }
      },
      ItemPile: ItemPile
    }
  };

  return window.CompanionShim;
})()
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shim_is_idempotent_and_marks_itself() {
        assert!(COMPANION_SHIM_JS.contains("window.CompanionShim && window.CompanionShim._initialized"));
        assert!(COMPANION_SHIM_JS.contains("_initialized: true"));
    }

    #[test]
    fn shim_has_no_leading_return() {
        // The script runs through Runtime.evaluate as an expression.
        assert!(!COMPANION_SHIM_JS.trim_start().starts_with("return"));
    }

    #[test]
    fn every_namespace_is_present() {
        for ns in ["sbc:", "item:", "club:", "user:", "store:", "notification:", "localization:", "util:"] {
            assert!(COMPANION_SHIM_JS.contains(ns), "missing namespace {ns}");
        }
    }
}
